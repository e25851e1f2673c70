// src/lib.rs
pub mod agent;
pub mod auth_store;
pub mod config;
pub mod connectors;
pub mod credentials;
pub mod dispatch;
pub mod engines;
pub mod error;
pub mod mcp_server;
pub mod normalize;
pub mod research;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export the rmcp types that appear in this crate's public API
pub use rmcp::model::{CallToolRequestParam, CallToolResult, Tool};

pub use crate::agent::{AgentEvent, AgentRequest, AgentRuntime};
pub use crate::config::SearchConfig;
pub use crate::credentials::{CredentialSource, Credentials, EnvCredentials};
pub use crate::dispatch::Dispatcher;
pub use crate::engines::{EngineId, Provider};
pub use crate::error::{is_error_outcome, SearchError};
pub use crate::research::{ModelClass, ResearchReport, ResearchTask, ToolCallRecord};
pub use crate::types::{
    ImageSearchResult, Query, SearchOutcome, SearchPayload, SearchResult, DEFAULT_NUM_RESULTS,
};

/// Search with the default configuration and environment credentials.
///
/// Returns a JSON array for keyword engines, free text for LLM engines, or an
/// `Error...` string.
pub async fn search(engine: &str, query: &str, num_results: u32) -> String {
    search_as(None, engine, query, num_results).await
}

/// [`search`] with a caller id forwarded to LLM-backed engines.
pub async fn search_as(
    caller_agent_id: Option<&str>,
    engine: &str,
    query: &str,
    num_results: u32,
) -> String {
    match Dispatcher::from_env() {
        Ok(dispatcher) => {
            dispatcher
                .search_as(caller_agent_id, engine, query, num_results)
                .await
        }
        Err(e) => e.to_string(),
    }
}

/// Run a research task and return the markdown report.
pub async fn research_task(
    query: &str,
    model_class: Option<ModelClass>,
) -> Result<String, SearchError> {
    let dispatcher = Dispatcher::from_env()?;
    let report = ResearchTask::new(&dispatcher)
        .with_model_class(model_class.unwrap_or_default())
        .run(query)
        .await?;
    Ok(report.report)
}

/// Tool descriptors for the engines enabled by the current environment.
pub fn list_search_tools() -> Vec<Tool> {
    let store = std::sync::Arc::new(auth_store::FileAuthStore::new_default());
    tools::list_search_tools(&EnvCredentials::with_store(store).snapshot())
}
