// Direct keyword search
pub mod brave;

// LLM provider web search
pub mod llm;

use reqwest::Client;

use crate::config::SearchConfig;
use crate::error::SearchError;

/// The one HTTP client every connector shares.
pub fn http_client(config: &SearchConfig) -> Result<Client, SearchError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| SearchError::Config(format!("HTTP client: {}", e)))
}
