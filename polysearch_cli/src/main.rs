use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;
use polysearch_core::Dispatcher;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polysearch_cli=info,polysearch_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // "polysearch <query>" -> "polysearch search <query>"
    let args = cli::normalize_args(std::env::args().collect());
    let cli = Cli::parse_from(args);

    let result = match Dispatcher::from_env() {
        Ok(dispatcher) => run(&cli, &dispatcher).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("{}", format_error(&e.to_string()));
        process::exit(1);
    }
}

async fn run(cli: &Cli, dispatcher: &Dispatcher) -> commands::Result<()> {
    match &cli.command {
        None => show_overview(dispatcher),
        Some(Commands::Search {
            query,
            engine,
            results,
        }) => search::run(cli, dispatcher, engine, query, *results).await,
        Some(Commands::Task { query, model_class }) => {
            task::run(cli, dispatcher, query, (*model_class).into()).await
        }
        Some(Commands::Engines) => engines::run(cli, dispatcher),
    }
}

/// Error outcomes already start with `Error`; only that word gets colored.
fn format_error(message: &str) -> String {
    match message.strip_prefix("Error") {
        Some(rest) => format!("{}{}", "Error".red().bold(), rest),
        None => format!("{}: {}", "Error".red().bold(), message),
    }
}

fn show_overview(dispatcher: &Dispatcher) -> commands::Result<()> {
    println!();
    println!(
        "{}  {}",
        "Polysearch".bold().cyan(),
        "- web search through Brave or LLM providers".dimmed()
    );
    println!();

    let enabled = dispatcher.credentials().enabled_engines();
    if enabled.is_empty() {
        println!(
            "  {}",
            "No engines configured. Run `polysearch engines` for the variables to set.".yellow()
        );
    } else {
        let names: Vec<&str> = enabled.iter().map(|e| e.as_str()).collect();
        println!("  {} {}", "Engines:".bold(), names.join(", "));
    }
    println!();
    println!("  {}", "polysearch <query>                 Search with Brave".dimmed());
    println!("  {}", "polysearch -e <engine> <query>     Search with another engine".dimmed());
    println!("  {}", "polysearch task <question>         Research report".dimmed());
    println!("  {}", "polysearch --help                  All options".dimmed());
    println!();
    Ok(())
}
