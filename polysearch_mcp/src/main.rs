use std::sync::Arc;
use tracing::{error, info, warn};

use polysearch_core::{
    mcp_server::{JsonRpcHandler, McpServer},
    transport::StdioTransport,
    Dispatcher,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries JSON-RPC only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "polysearch_mcp=info,polysearch_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Polysearch MCP Server");

    let dispatcher = match Dispatcher::from_env() {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let enabled = dispatcher.credentials().enabled_engines();
    if enabled.is_empty() {
        warn!("No search engines configured; tools/list will be empty");
    } else {
        info!(engines = enabled.len(), "Search engines enabled");
    }

    let server = McpServer::new(Arc::new(dispatcher));
    let handler = JsonRpcHandler::new(server);
    let transport = StdioTransport::new(handler);

    info!("MCP Server ready, listening on stdio");

    if let Err(e) = transport.run().await {
        error!("Transport error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
