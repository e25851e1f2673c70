//! Engine dispatch: name → credential check → transport → typed outcome.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::agent::{invoke_llm_search, AgentRuntime, LlmSearch};
use crate::auth_store::FileAuthStore;
use crate::config::SearchConfig;
use crate::connectors::brave::{BraveClient, KeywordSearch};
use crate::connectors::http_client;
use crate::connectors::llm::HttpAgentRuntime;
use crate::credentials::{CredentialSource, Credentials, EnvCredentials};
use crate::engines::{BraveVertical, EngineId, TransportKind};
use crate::error::SearchError;
use crate::types::{outcome_to_legacy, Query, SearchOutcome, SearchPayload, DEFAULT_NUM_RESULTS};

/// Routes queries to the engine table's transports.
///
/// Cheap to share behind an `Arc`; holds no per-call state.
#[derive(Clone)]
pub struct Dispatcher {
    credentials: Arc<dyn CredentialSource>,
    keyword: Arc<dyn KeywordSearch>,
    agent: Arc<dyn AgentRuntime>,
    config: Arc<SearchConfig>,
}

impl Dispatcher {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        keyword: Arc<dyn KeywordSearch>,
        agent: Arc<dyn AgentRuntime>,
        config: SearchConfig,
    ) -> Self {
        Self {
            credentials,
            keyword,
            agent,
            config: Arc::new(config),
        }
    }

    /// Real HTTP transports built from `config`.
    pub fn from_config(
        config: SearchConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, SearchError> {
        let client = http_client(&config)?;
        let keyword = Arc::new(BraveClient::new(
            client.clone(),
            config.endpoints.brave.clone(),
        ));
        let agent = Arc::new(HttpAgentRuntime::new(client, config.endpoints.clone()));
        Ok(Self::new(credentials, keyword, agent, config))
    }

    /// Default config file plus environment (and `auth.json`) credentials.
    pub fn from_env() -> Result<Self, SearchError> {
        let config = SearchConfig::load_default()?;
        let store = Arc::new(FileAuthStore::new_default());
        Self::from_config(config, Arc::new(EnvCredentials::with_store(store)))
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_keyword_search(mut self, keyword: Arc<dyn KeywordSearch>) -> Self {
        self.keyword = keyword;
        self
    }

    pub fn with_agent_runtime(mut self, agent: Arc<dyn AgentRuntime>) -> Self {
        self.agent = agent;
        self
    }

    /// A fresh credential snapshot.
    pub fn credentials(&self) -> Credentials {
        self.credentials.snapshot()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn agent(&self) -> &dyn AgentRuntime {
        self.agent.as_ref()
    }

    /// Dispatch by engine name. Unknown names fail before anything else.
    pub async fn dispatch(
        &self,
        engine: &str,
        query: &str,
        num_results: u32,
        caller_agent_id: Option<&str>,
    ) -> SearchOutcome {
        let engine = match engine.parse::<EngineId>() {
            Ok(id) => id,
            Err(e) => {
                warn!(engine, kind = e.code_str(), "rejected search");
                return Err(e);
            }
        };
        let query = Query::new(engine, query)
            .with_num_results(num_results)
            .with_caller(caller_agent_id);
        self.dispatch_query(&query).await
    }

    pub async fn dispatch_query(&self, query: &Query) -> SearchOutcome {
        let started = Instant::now();
        debug!(
            engine = %query.engine,
            num_results = query.num_results,
            has_caller = query.caller_agent_id.is_some(),
            "dispatching search"
        );

        let outcome = self.route(query).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(payload) => info!(
                engine = %query.engine,
                records = payload.len(),
                structured = payload.is_structured(),
                elapsed_ms,
                "search completed"
            ),
            Err(e) => warn!(
                engine = %query.engine,
                kind = e.code_str(),
                elapsed_ms,
                "search failed"
            ),
        }
        outcome
    }

    async fn route(&self, query: &Query) -> SearchOutcome {
        let descriptor = query.engine.descriptor();
        let credentials = self.credentials.snapshot();
        let api_key = credentials.require(descriptor.provider)?;

        match descriptor.transport {
            TransportKind::DirectHttp(BraveVertical::Web) => self
                .keyword
                .web(api_key, &query.text, query.num_results)
                .await
                .map(SearchPayload::Results),
            TransportKind::DirectHttp(BraveVertical::Images) => self
                .keyword
                .images(api_key, &query.text, query.num_results)
                .await
                .map(SearchPayload::Images),
            TransportKind::LlmAgent(spec) => {
                let model = self
                    .config
                    .model_override(query.engine)
                    .unwrap_or(spec.model);
                invoke_llm_search(
                    self.agent.as_ref(),
                    &query.text,
                    LlmSearch {
                        provider: descriptor.provider,
                        api_key,
                        model,
                        display_name: spec.display_name,
                        instructions: spec.instructions,
                        signal_tool: spec.signal_tool,
                        num_results: query.num_results,
                        caller_agent_id: query.caller_agent_id.as_deref(),
                    },
                )
                .await
            }
        }
    }

    /// Dispatch from a tool call's JSON arguments.
    ///
    /// `query` must be a JSON string and is checked first; `engine` defaults
    /// to `brave`.
    pub async fn dispatch_tool_args(
        &self,
        args: &Map<String, Value>,
        caller_agent_id: Option<&str>,
    ) -> SearchOutcome {
        let query = match args.get("query") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(rejected(SearchError::invalid_query(other))),
            None => return Err(rejected(SearchError::invalid_query(&Value::Null))),
        };

        let engine = match args.get("engine") {
            None | Some(Value::Null) => EngineId::Brave.as_str().to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        if let Err(e) = engine.parse::<EngineId>() {
            return Err(rejected(e));
        }

        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(DEFAULT_NUM_RESULTS);

        self.dispatch(&engine, query, num_results, caller_agent_id)
            .await
    }

    /// Legacy string form of [`Dispatcher::dispatch`] without a caller id.
    pub async fn search(&self, engine: &str, query: &str, num_results: u32) -> String {
        self.search_as(None, engine, query, num_results).await
    }

    pub async fn search_as(
        &self,
        caller_agent_id: Option<&str>,
        engine: &str,
        query: &str,
        num_results: u32,
    ) -> String {
        outcome_to_legacy(
            self.dispatch(engine, query, num_results, caller_agent_id)
                .await,
        )
    }
}

fn rejected(e: SearchError) -> SearchError {
    warn!(kind = e.code_str(), "rejected tool call");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentEvent, AgentRequest};
    use crate::engines::Provider;
    use crate::error::is_error_outcome;
    use crate::types::{ImageSearchResult, SearchResult};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingKeyword {
        calls: AtomicUsize,
        counts: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl KeywordSearch for CountingKeyword {
        async fn web(
            &self,
            _api_key: &str,
            query: &str,
            count: u32,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.counts.lock().unwrap().push(count);
            Ok((0..count)
                .map(|i| SearchResult {
                    title: format!("{} #{}", query, i),
                    url: format!("https://example.com/{}", i),
                    snippet: "s".into(),
                })
                .collect())
        }

        async fn images(
            &self,
            _api_key: &str,
            _query: &str,
            _count: u32,
        ) -> Result<Vec<ImageSearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ImageSearchResult {
                title: "Untitled".into(),
                url: "https://img.example/a.png".into(),
                thumbnail: "https://img.example/a.png".into(),
                source: "Unknown".into(),
                width: None,
                height: None,
            }])
        }
    }

    #[derive(Default)]
    struct RecordingAgent {
        requests: Mutex<Vec<AgentRequest>>,
        events: Vec<AgentEvent>,
    }

    impl RecordingAgent {
        fn replying(events: Vec<AgentEvent>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                events,
            }
        }
    }

    #[async_trait]
    impl AgentRuntime for RecordingAgent {
        async fn stream(&self, request: AgentRequest) -> BoxStream<'static, AgentEvent> {
            self.requests.lock().unwrap().push(request);
            stream::iter(self.events.clone()).boxed()
        }
    }

    fn dispatcher(
        credentials: Credentials,
        keyword: Arc<CountingKeyword>,
        agent: Arc<RecordingAgent>,
    ) -> Dispatcher {
        Dispatcher::from_config(SearchConfig::default(), Arc::new(credentials))
            .unwrap()
            .with_keyword_search(keyword)
            .with_agent_runtime(agent)
    }

    #[tokio::test]
    async fn test_unknown_engine_message() {
        let d = dispatcher(
            Credentials::new(),
            Arc::default(),
            Arc::default(),
        );
        assert_eq!(
            d.search("unknown-engine", "q", 5).await,
            "Error: Invalid or unsupported search engine unknown-engine"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let keyword = Arc::new(CountingKeyword::default());
        let agent = Arc::new(RecordingAgent::default());
        let d = dispatcher(Credentials::new(), keyword.clone(), agent.clone());

        for id in EngineId::ALL {
            let out = d.search(id.as_str(), "sunset photo", 2).await;
            assert!(out.ends_with("API key not configured."), "{}", out);
            assert!(is_error_outcome(&out));
        }
        assert_eq!(
            d.search("brave", "sunset photo", 2).await,
            "Error: Brave API key not configured."
        );
        assert_eq!(
            d.search("sonar-pro", "q", 2).await,
            "Error: OpenRouter API key not configured."
        );
        assert_eq!(keyword.calls.load(Ordering::SeqCst), 0);
        assert!(agent.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_brave_routes_to_keyword_search() {
        let keyword = Arc::new(CountingKeyword::default());
        let d = dispatcher(
            Credentials::new().with(Provider::Brave, "bk"),
            keyword.clone(),
            Arc::default(),
        );
        let payload = d.dispatch("brave", "rust", 3, None).await.unwrap();
        assert_eq!(payload.len(), 3);
        let payload = d.dispatch("brave-images", "cat", 3, None).await.unwrap();
        assert!(matches!(payload, SearchPayload::Images(ref v) if v.len() == 1));
        assert_eq!(keyword.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_num_results_floor_is_one() {
        let keyword = Arc::new(CountingKeyword::default());
        let d = dispatcher(
            Credentials::new().with(Provider::Brave, "bk"),
            keyword.clone(),
            Arc::default(),
        );
        d.dispatch("brave", "rust", 0, None).await.unwrap();
        assert_eq!(*keyword.counts.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_llm_engine_request_shape() {
        let agent = Arc::new(RecordingAgent::replying(vec![
            AgentEvent::TextDelta("answer".into()),
            AgentEvent::Completed(None),
        ]));
        let d = dispatcher(
            Credentials::new()
                .with(Provider::OpenRouter, "or-key")
                .with(Provider::Anthropic, "ant-key"),
            Arc::default(),
            agent.clone(),
        );

        let out = d.search_as(Some("agent-7"), "sonar-pro", "q", 4).await;
        assert_eq!(out, "answer");
        let out = d.search("anthropic", "q", 4).await;
        assert_eq!(out, "answer");

        let requests = agent.requests.lock().unwrap();
        assert_eq!(requests[0].provider, Provider::OpenRouter);
        assert_eq!(requests[0].model, "perplexity/sonar-pro");
        assert_eq!(requests[0].api_key, "or-key");
        assert!(requests[0].signal_tool.is_none());
        assert_eq!(requests[0].caller_agent_id.as_deref(), Some("agent-7"));
        assert_eq!(requests[0].name, "Perplexity Sonar Pro Search");

        assert_eq!(requests[1].model, "claude-sonnet-4-20250514");
        assert_eq!(requests[1].signal_tool.map(|t| t.name), Some("web_search"));
        assert_eq!(requests[1].caller_agent_id, None);
    }

    #[tokio::test]
    async fn test_model_override_from_config() {
        let agent = Arc::new(RecordingAgent::replying(vec![AgentEvent::Completed(Some(
            "ok".into(),
        ))]));
        let mut config = SearchConfig::default();
        config
            .models
            .insert("google".into(), "gemini-2.5-pro".into());
        let d = Dispatcher::new(
            Arc::new(Credentials::new().with(Provider::Google, "g")),
            Arc::new(CountingKeyword::default()),
            agent.clone(),
            config,
        );
        d.dispatch("google", "q", 5, None).await.unwrap();
        assert_eq!(agent.requests.lock().unwrap()[0].model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_agent_error_discards_partial_text() {
        let agent = Arc::new(RecordingAgent::replying(vec![
            AgentEvent::TextDelta("Breaking: partial".into()),
            AgentEvent::Error("Anthropic API error: 529 - Overloaded".into()),
        ]));
        let d = dispatcher(
            Credentials::new().with(Provider::Anthropic, "k"),
            Arc::default(),
            agent,
        );
        let out = d.search("anthropic", "latest news", 5).await;
        assert!(out.starts_with("Error:"));
        assert!(out.contains("Overloaded"));
        assert!(!out.contains("Breaking: partial"));
    }

    #[tokio::test]
    async fn test_tool_args_validation_order() {
        let keyword = Arc::new(CountingKeyword::default());
        let d = dispatcher(
            Credentials::new().with(Provider::Brave, "bk"),
            keyword.clone(),
            Arc::default(),
        );

        let args = json!({"engine": "brave", "query": 123});
        let out = outcome_to_legacy(
            d.dispatch_tool_args(args.as_object().unwrap(), None).await,
        );
        assert_eq!(
            out,
            "Error: Search query must be a string, received number: 123"
        );

        // query type is checked before the engine name
        let args = json!({"engine": "bing", "query": 123});
        let err = d
            .dispatch_tool_args(args.as_object().unwrap(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "invalid_input");

        let args = json!({"engine": "query", "query": 5});
        let out = outcome_to_legacy(
            d.dispatch_tool_args(args.as_object().unwrap(), None).await,
        );
        assert_eq!(
            out,
            "Error: Search query must be a string, received number: 5"
        );

        let args = json!({"engine": "bing", "query": "rust"});
        let err = d
            .dispatch_tool_args(args.as_object().unwrap(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "unknown_engine");

        let args = json!({"query": "rust", "num_results": 2});
        let payload = d
            .dispatch_tool_args(args.as_object().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(payload.len(), 2);

        let args = json!({"engine": "brave"});
        let out = outcome_to_legacy(
            d.dispatch_tool_args(args.as_object().unwrap(), None).await,
        );
        assert_eq!(
            out,
            "Error: Search query must be a string, received null: null"
        );
        assert_eq!(keyword.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_swapped_credentials_apply_to_next_call() {
        let keyword = Arc::new(CountingKeyword::default());
        let d = dispatcher(Credentials::new(), keyword.clone(), Arc::default());
        assert_eq!(
            d.search("brave", "rust", 1).await,
            "Error: Brave API key not configured."
        );

        let d = d.with_credentials(Arc::new(Credentials::new().with(Provider::Brave, "bk")));
        assert!(d.credentials().is_engine_enabled(EngineId::Brave));
        assert!(!is_error_outcome(&d.search("brave", "rust", 1).await));
        assert_eq!(keyword.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_identical_dispatches_are_identical() {
        let d = dispatcher(
            Credentials::new().with(Provider::Brave, "bk"),
            Arc::default(),
            Arc::default(),
        );
        let a = d.search("brave", "rust", 4).await;
        let b = d.search("brave", "rust", 4).await;
        assert_eq!(a, b);
    }
}
