use clap::{Parser, Subcommand, ValueEnum};
use polysearch_core::ModelClass;

#[derive(Parser)]
#[command(name = "polysearch")]
#[command(about = "Polysearch - web search through Brave or LLM providers")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  polysearch \"rust async runtimes\"              Search the web with Brave
  polysearch -e brave-images \"aurora borealis\"  Image search
  polysearch -e anthropic \"latest rust release\" Ask an LLM engine with live search
  polysearch task \"state of WebAssembly GC\"     Multi-round research report
  polysearch engines                            Show which engines are configured

\x1b[1;36mAuthentication:\x1b[0m
  BRAVE_API_KEY, ANTHROPIC_API_KEY, OPENAI_API_KEY, GOOGLE_API_KEY,
  XAI_API_KEY, OPENROUTER_API_KEY enable the matching engines.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print raw JSON instead of formatted output
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the web with one engine
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  polysearch search \"rust\"                   Brave web search
  polysearch search -e sonar-pro -n 3 \"rust\" Perplexity Sonar Pro via OpenRouter
  polysearch search --json \"rust\"            Raw JSON array")]
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Engine id (see `polysearch engines`)
        #[arg(short, long, default_value = "brave")]
        engine: String,

        /// Number of results to request
        #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
        results: u32,
    },

    /// Run a multi-round research task and print the report
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  polysearch task \"compare tokio and async-std\"
  polysearch task -m reasoning \"history of the borrow checker\"")]
    Task {
        /// Research question
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Planner model class
        #[arg(short, long, value_enum, default_value_t = ModelClassArg::Standard)]
        model_class: ModelClassArg,
    },

    /// List the engines enabled by the current credentials
    Engines,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModelClassArg {
    Mini,
    Standard,
    Reasoning,
}

impl From<ModelClassArg> for ModelClass {
    fn from(arg: ModelClassArg) -> Self {
        match arg {
            ModelClassArg::Mini => ModelClass::Mini,
            ModelClassArg::Standard => ModelClass::Standard,
            ModelClassArg::Reasoning => ModelClass::Reasoning,
        }
    }
}

const BUILT_IN_COMMANDS: &[&str] = &[
    "search", "task", "engines", "help", "--help", "-h", "--version", "-V",
];

const GLOBAL_FLAGS: &[&str] = &["--json", "-j"];

/// Rewrite `polysearch <query>` into `polysearch search <query>`.
///
/// The first argument that is not a global flag decides: a built-in
/// subcommand is left alone, anything else is treated as the start of a
/// search.
pub fn normalize_args(mut args: Vec<String>) -> Vec<String> {
    let first = args
        .iter()
        .skip(1)
        .position(|arg| !GLOBAL_FLAGS.contains(&arg.as_str()));

    if let Some(idx) = first {
        let real_idx = idx + 1;
        if !BUILT_IN_COMMANDS.contains(&args[real_idx].as_str()) {
            args.insert(real_idx, "search".to_string());
        }
    }
    args
}
