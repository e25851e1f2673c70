mod pretty;

pub use pretty::{format_engines, format_payload, format_research_summary, render_markdown};
