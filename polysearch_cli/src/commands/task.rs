use crate::cli::Cli;
use crate::commands::{spinner, Result};
use crate::output;
use polysearch_core::{Dispatcher, ModelClass, ResearchTask};

pub async fn run(cli: &Cli, dispatcher: &Dispatcher, query: &[String], model_class: ModelClass) -> Result<()> {
    let query = query.join(" ");
    let progress = spinner(
        !cli.json,
        format!("Researching '{}' with a {} planner...", query, model_class),
    );

    let report = ResearchTask::new(dispatcher)
        .with_model_class(model_class)
        .run(&query)
        .await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    let report = report?;
    tracing::info!(
        rounds = report.rounds,
        calls = report.calls.len(),
        "research task finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::render_markdown(&report.report));
        println!();
        println!("{}", output::format_research_summary(&report));
    }
    Ok(())
}
