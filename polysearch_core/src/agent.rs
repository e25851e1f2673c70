//! The seam between search dispatch and whatever runs the model.
//!
//! A runtime turns an [`AgentRequest`] into a stream of [`AgentEvent`]s;
//! [`run_single_turn`] folds that stream into one final string.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::engines::Provider;
use crate::error::SearchError;
use crate::types::SearchPayload;

/// A capability marker handed to the model. Runtimes map it onto the
/// provider's native search tool; it never executes anything itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalTool {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Everything a runtime needs to drive one turn.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub messages: Vec<Message>,
    pub signal_tool: Option<SignalTool>,
    /// Source-count hint forwarded to providers that accept one.
    pub max_results: Option<u32>,
    pub caller_agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    TextDelta(String),
    /// Full text of the turn, if the runtime reports one at the end.
    Completed(Option<String>),
    Error(String),
}

#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn stream(&self, request: AgentRequest) -> BoxStream<'static, AgentEvent>;
}

/// Drive one turn to completion.
///
/// Deltas are concatenated; an error event discards them and wins. A
/// `Completed` carrying text is used only when no deltas arrived.
pub async fn run_single_turn(
    runtime: &dyn AgentRuntime,
    request: AgentRequest,
) -> Result<String, SearchError> {
    let mut events = runtime.stream(request).await;
    let mut text = String::new();

    while let Some(event) = events.next().await {
        match event {
            AgentEvent::TextDelta(delta) => text.push_str(&delta),
            AgentEvent::Completed(full) => {
                if text.is_empty() {
                    if let Some(full) = full {
                        text = full;
                    }
                }
                break;
            }
            AgentEvent::Error(message) => {
                debug!(partial_len = text.len(), "agent stream reported an error");
                return Err(SearchError::Agent(message));
            }
        }
    }

    Ok(text)
}

/// Parameters of one LLM-backed search, as taken from the engine table.
#[derive(Debug, Clone)]
pub struct LlmSearch<'a> {
    pub provider: Provider,
    pub api_key: &'a str,
    pub model: &'a str,
    pub display_name: &'a str,
    pub instructions: &'a str,
    pub signal_tool: Option<SignalTool>,
    pub num_results: u32,
    pub caller_agent_id: Option<&'a str>,
}

/// Run `query` as a single user turn and return the model's text verbatim.
pub async fn invoke_llm_search(
    runtime: &dyn AgentRuntime,
    query: &str,
    search: LlmSearch<'_>,
) -> Result<SearchPayload, SearchError> {
    let request = AgentRequest {
        provider: search.provider,
        api_key: search.api_key.to_string(),
        model: search.model.to_string(),
        name: format!("{} Search", search.display_name),
        description: format!("Web search through {}", search.display_name),
        instructions: search.instructions.to_string(),
        messages: vec![Message::user(query)],
        signal_tool: search.signal_tool,
        max_results: Some(search.num_results),
        caller_agent_id: search.caller_agent_id.map(str::to_string),
    };
    run_single_turn(runtime, request)
        .await
        .map(SearchPayload::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct Scripted(Vec<AgentEvent>);

    #[async_trait]
    impl AgentRuntime for Scripted {
        async fn stream(&self, _request: AgentRequest) -> BoxStream<'static, AgentEvent> {
            stream::iter(self.0.clone()).boxed()
        }
    }

    fn request() -> AgentRequest {
        AgentRequest {
            provider: Provider::Anthropic,
            api_key: "k".into(),
            model: "m".into(),
            name: "n".into(),
            description: "d".into(),
            instructions: "i".into(),
            messages: vec![Message::user("q")],
            signal_tool: None,
            max_results: None,
            caller_agent_id: None,
        }
    }

    #[tokio::test]
    async fn test_deltas_are_concatenated() {
        let runtime = Scripted(vec![
            AgentEvent::TextDelta("Hello, ".into()),
            AgentEvent::TextDelta("world".into()),
            AgentEvent::Completed(None),
        ]);
        assert_eq!(
            run_single_turn(&runtime, request()).await.unwrap(),
            "Hello, world"
        );
    }

    #[tokio::test]
    async fn test_error_discards_partial_text() {
        let runtime = Scripted(vec![
            AgentEvent::TextDelta("partial answer".into()),
            AgentEvent::Error("overloaded_error".into()),
        ]);
        let err = run_single_turn(&runtime, request()).await.unwrap_err();
        let msg = err.to_string();
        assert_eq!(msg, "Error: overloaded_error");
        assert!(!msg.contains("partial answer"));
    }

    #[tokio::test]
    async fn test_completed_text_used_without_deltas() {
        let runtime = Scripted(vec![AgentEvent::Completed(Some("final".into()))]);
        assert_eq!(run_single_turn(&runtime, request()).await.unwrap(), "final");

        let runtime = Scripted(vec![
            AgentEvent::TextDelta("streamed".into()),
            AgentEvent::Completed(Some("ignored".into())),
        ]);
        assert_eq!(
            run_single_turn(&runtime, request()).await.unwrap(),
            "streamed"
        );
    }

    #[tokio::test]
    async fn test_stream_ending_without_completion_returns_text() {
        let runtime = Scripted(vec![AgentEvent::TextDelta("abc".into())]);
        assert_eq!(run_single_turn(&runtime, request()).await.unwrap(), "abc");
    }
}
