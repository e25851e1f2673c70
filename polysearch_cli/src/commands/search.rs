use crate::cli::Cli;
use crate::commands::{spinner, Result};
use crate::output;
use polysearch_core::Dispatcher;

pub async fn run(cli: &Cli, dispatcher: &Dispatcher, engine: &str, query: &[String], results: u32) -> Result<()> {
    let query = query.join(" ");
    let progress = spinner(!cli.json, format!("Searching {} for '{}'...", engine, query));

    let outcome = dispatcher.dispatch(engine, &query, results, None).await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    let payload = outcome?;
    if cli.json {
        println!("{}", payload.to_wire()?);
    } else {
        print!("{}", output::format_payload(engine, &query, &payload));
    }
    Ok(())
}
