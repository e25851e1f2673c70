use crate::cli::Cli;
use crate::commands::Result;
use crate::output;
use polysearch_core::{tools, Dispatcher};

pub fn run(cli: &Cli, dispatcher: &Dispatcher) -> Result<()> {
    let credentials = dispatcher.credentials();

    if cli.json {
        let descriptors = tools::list_search_tools(&credentials);
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    print!("{}", output::format_engines(&credentials));
    Ok(())
}
