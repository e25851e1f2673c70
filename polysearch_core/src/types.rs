use serde::{Deserialize, Serialize};

use crate::engines::EngineId;
use crate::error::SearchError;

pub const DEFAULT_NUM_RESULTS: u32 = 5;

/// A keyword search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// An image search hit. Dimensions are omitted when the backend omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub num_results: u32,
    pub engine: EngineId,
    pub caller_agent_id: Option<String>,
}

impl Query {
    pub fn new(engine: EngineId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            num_results: DEFAULT_NUM_RESULTS,
            engine,
            caller_agent_id: None,
        }
    }

    /// Values below 1 are raised to 1.
    pub fn with_num_results(mut self, n: u32) -> Self {
        self.num_results = n.max(1);
        self
    }

    pub fn with_caller(mut self, caller_agent_id: Option<&str>) -> Self {
        self.caller_agent_id = caller_agent_id.map(str::to_string);
        self
    }
}

/// What a successful dispatch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPayload {
    Results(Vec<SearchResult>),
    Images(Vec<ImageSearchResult>),
    /// Free text from an LLM-backed engine.
    Text(String),
}

impl SearchPayload {
    /// JSON array for structured results, the text verbatim otherwise.
    pub fn to_wire(&self) -> Result<String, SearchError> {
        match self {
            SearchPayload::Results(results) => Ok(serde_json::to_string(results)?),
            SearchPayload::Images(images) => Ok(serde_json::to_string(images)?),
            SearchPayload::Text(text) => Ok(text.clone()),
        }
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, SearchPayload::Text(_))
    }

    /// Record count, or 0 for free text.
    pub fn len(&self) -> usize {
        match self {
            SearchPayload::Results(r) => r.len(),
            SearchPayload::Images(r) => r.len(),
            SearchPayload::Text(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SearchPayload::Text(t) => t.is_empty(),
            _ => self.len() == 0,
        }
    }
}

pub type SearchOutcome = Result<SearchPayload, SearchError>;

/// Collapse an outcome into the legacy single-string convention.
pub fn outcome_to_legacy(outcome: SearchOutcome) -> String {
    match outcome.and_then(|payload| payload.to_wire()) {
        Ok(s) => s,
        Err(e) => e.to_string(),
    }
}
