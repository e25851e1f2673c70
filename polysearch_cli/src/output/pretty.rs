//! Pretty formatter for terminal output.
//!
//! Web hits render as numbered cards, images as cards with their source and
//! dimensions, free text and reports as markdown.

use owo_colors::OwoColorize;
use polysearch_core::{
    Credentials, EngineId, ImageSearchResult, ResearchReport, SearchPayload, SearchResult,
};
use termimad::{crossterm::style::Color, MadSkin};

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

/// Indent for card content (after number)
const CARD_INDENT: &str = "      ";

/// Wrapped snippets never get narrower than this.
const MIN_WRAP: usize = 20;

pub fn format_payload(engine: &str, query: &str, payload: &SearchPayload) -> String {
    let width = terminal_width();
    let mut output = String::new();

    match payload {
        SearchPayload::Results(results) => {
            output.push_str(&format_section_header(engine, Some(results.len()), width));
            output.push('\n');
            if results.is_empty() {
                output.push_str(&format!("{}\n", no_results(query).dimmed()));
            }
            for (i, result) in results.iter().enumerate() {
                output.push_str(&format_card(result, i + 1, width));
                if i + 1 < results.len() {
                    output.push('\n');
                }
            }
        }
        SearchPayload::Images(images) => {
            output.push_str(&format_section_header(engine, Some(images.len()), width));
            output.push('\n');
            if images.is_empty() {
                output.push_str(&format!("{}\n", no_results(query).dimmed()));
            }
            for (i, image) in images.iter().enumerate() {
                output.push_str(&format_image_card(image, i + 1));
                if i + 1 < images.len() {
                    output.push('\n');
                }
            }
        }
        SearchPayload::Text(text) => {
            output.push_str(&format_section_header(engine, None, width));
            output.push('\n');
            output.push_str(&render_markdown(text));
        }
    }
    output
}

fn no_results(query: &str) -> String {
    format!("      No results for '{}'.", query)
}

fn format_card(result: &SearchResult, index: usize, width: usize) -> String {
    let mut output = String::new();

    let index_str = format!(" {:>3}. ", index).cyan().bold().to_string();
    let title = if result.title.trim().is_empty() {
        "(no title)".to_string()
    } else {
        truncate_str(&result.title, width.saturating_sub(CARD_INDENT.len()))
    };
    output.push_str(&format!("{}{}\n", index_str, title.bold()));

    let hyperlink = format_hyperlink(&result.url, &result.url);
    output.push_str(&format!("{}{}\n", CARD_INDENT, hyperlink.cyan()));

    let snippet = clean_snippet(&result.snippet);
    for line in wrap_indented(&snippet, width) {
        output.push_str(&format!("{}\n", line.dimmed()));
    }

    output
}

fn format_image_card(image: &ImageSearchResult, index: usize) -> String {
    let mut output = String::new();

    let index_str = format!(" {:>3}. ", index).cyan().bold().to_string();
    output.push_str(&format!("{}{}\n", index_str, image.title.bold()));

    let hyperlink = format_hyperlink(&image.url, &image.url);
    output.push_str(&format!("{}{}\n", CARD_INDENT, hyperlink.cyan()));

    let mut meta = image.source.clone();
    if let Some(dims) = format_dimensions(image.width, image.height) {
        meta.push_str(" · ");
        meta.push_str(&dims);
    }
    output.push_str(&format!("{}{}\n", CARD_INDENT, meta.dimmed()));

    if image.thumbnail != image.url {
        output.push_str(&format!(
            "{}{} {}\n",
            CARD_INDENT,
            "thumbnail:".dimmed(),
            format_hyperlink(&image.thumbnail, &image.thumbnail).dimmed()
        ));
    }

    output
}

fn format_dimensions(width: Option<u64>, height: Option<u64>) -> Option<String> {
    match (width, height) {
        (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
        (Some(w), None) => Some(format!("{}px wide", w)),
        (None, Some(h)) => Some(format!("{}px tall", h)),
        (None, None) => None,
    }
}

/// Every engine with its enabled state and the variable that gates it.
pub fn format_engines(credentials: &Credentials) -> String {
    let width = terminal_width();
    let enabled = credentials.enabled_engines();
    let mut output = format_section_header("Engines", None, width);
    output.push_str("\n\n");

    for engine in EngineId::ALL {
        let descriptor = engine.descriptor();
        if enabled.contains(&engine) {
            output.push_str(&format!(
                "  {} {:<20} {}\n",
                "✓".green().bold(),
                engine.as_str().bold(),
                descriptor.description.dimmed()
            ));
        } else {
            let hint = format!("set {} to enable", engine.provider().env_var());
            output.push_str(&format!(
                "  {} {:<20} {}\n",
                "✗".dimmed(),
                engine.as_str().dimmed(),
                hint.dimmed()
            ));
        }
    }

    if enabled.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "  {}\n",
            "No engines configured. Export an API key and run again.".yellow()
        ));
    }
    output
}

pub fn format_research_summary(report: &ResearchReport) -> String {
    let failed = report.calls.iter().filter(|c| !c.ok).count();
    let mut summary = format!(
        "{} round{}, {} search{}",
        report.rounds,
        if report.rounds == 1 { "" } else { "s" },
        report.calls.len(),
        if report.calls.len() == 1 { "" } else { "es" },
    );
    if failed > 0 {
        summary.push_str(&format!(" ({} failed)", failed));
    }
    format!("{} {}", "──".cyan(), summary.dimmed())
}

pub fn render_markdown(text: &str) -> String {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(Color::Cyan);
    skin.bold.set_fg(Color::Yellow);
    skin.inline_code.set_fg(Color::Green);
    skin.term_text(text).to_string()
}

fn format_section_header(label: &str, count: Option<usize>, width: usize) -> String {
    let count_str = match count {
        Some(n) => format!(" ({} results)", n),
        None => String::new(),
    };

    let header_text = format!("{}{}", label, count_str);
    let line_len = (width.saturating_sub(header_text.len() + 4)).min(60);
    let line = "─".repeat(line_len);

    format!(
        "{} {} {}",
        "──".cyan(),
        header_text.green().bold(),
        line.cyan()
    )
}

/// Wrap to the terminal width under the card indent.
fn wrap_indented(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let options = textwrap::Options::new(width.max(MIN_WRAP + CARD_INDENT.len()))
        .initial_indent(CARD_INDENT)
        .subsequent_indent(CARD_INDENT);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

fn truncate_str(s: &str, max_len: usize) -> String {
    // Take first line only
    let first_line = s.lines().next().unwrap_or(s);

    if first_line.chars().count() <= max_len || max_len < 4 {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

fn clean_snippet(s: &str) -> String {
    s.replace("<strong>", "")
        .replace("</strong>", "")
        .replace(['\n', '\r'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Format a URL as a clickable hyperlink using OSC 8 escape sequences.
fn format_hyperlink(url: &str, display_text: &str) -> String {
    // OSC 8 with BEL terminators
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", url, display_text)
}
