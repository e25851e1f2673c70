// src/error.rs
use serde_json::json;

/// Every failure a search can produce.
///
/// `Display` renders the exact legacy outcome string, so `err.to_string()` is
/// what older consumers expect to see in place of results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Error: Search query must be a string, received {kind}: {value}")]
    InvalidQuery { kind: &'static str, value: String },

    #[error("Error: Invalid or unsupported search engine {0}")]
    UnknownEngine(String),

    #[error("Error: Unknown tool {0}")]
    UnknownTool(String),

    #[error("Error: {provider} API key not configured.")]
    MissingCredential { provider: &'static str },

    #[error("Error: Received an invalid response structure from {api}.")]
    InvalidResponse { api: &'static str },

    #[error("Error performing {backend} search: {message}")]
    Transport {
        backend: &'static str,
        message: String,
    },

    #[error("Error: {0}")]
    Agent(String),

    #[error("Error: No search engines configured. Set one of BRAVE_API_KEY, ANTHROPIC_API_KEY, OPENAI_API_KEY, GOOGLE_API_KEY, XAI_API_KEY or OPENROUTER_API_KEY.")]
    NoEnginesConfigured,

    #[error("Error: Invalid configuration: {0}")]
    Config(String),

    #[error("Error: Failed to encode results: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SearchError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery { .. } => "invalid_input",
            SearchError::UnknownEngine(_) => "unknown_engine",
            SearchError::UnknownTool(_) => "unknown_tool",
            SearchError::MissingCredential { .. } => "missing_credential",
            SearchError::InvalidResponse { .. } => "invalid_response",
            SearchError::Transport { .. } => "upstream_error",
            SearchError::Agent(_) => "agent_error",
            SearchError::NoEnginesConfigured => "not_configured",
            SearchError::Config(_) => "config_error",
            SearchError::Serialization(_) => "internal_error",
        }
    }

    pub fn to_jsonrpc_error(&self) -> serde_json::Value {
        let code = match self {
            SearchError::InvalidQuery { .. }
            | SearchError::UnknownEngine(_)
            | SearchError::UnknownTool(_) => -32602,
            _ => -32603,
        };
        json!({
            "code": code,
            "message": self.to_string(),
            "data": { "kind": self.code_str() },
        })
    }

    pub(crate) fn invalid_query(value: &serde_json::Value) -> Self {
        SearchError::InvalidQuery {
            kind: json_type_name(value),
            value: value.to_string(),
        }
    }
}

/// Legacy failure check for string outcomes.
///
/// Transport failures read `Error performing ...` without the colon, so both
/// prefixes count.
pub fn is_error_outcome(outcome: &str) -> bool {
    outcome.starts_with("Error:") || outcome.starts_with("Error performing ")
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_messages() {
        assert_eq!(
            SearchError::UnknownEngine("unknown-engine".into()).to_string(),
            "Error: Invalid or unsupported search engine unknown-engine"
        );
        assert_eq!(
            SearchError::MissingCredential { provider: "Brave" }.to_string(),
            "Error: Brave API key not configured."
        );
        assert_eq!(
            SearchError::InvalidResponse { api: "Brave API" }.to_string(),
            "Error: Received an invalid response structure from Brave API."
        );
        assert_eq!(
            SearchError::Transport {
                backend: "Brave image",
                message: "connection refused".into()
            }
            .to_string(),
            "Error performing Brave image search: connection refused"
        );
    }

    #[test]
    fn test_invalid_query_names_json_type() {
        let err = SearchError::invalid_query(&json!(123));
        assert_eq!(
            err.to_string(),
            "Error: Search query must be a string, received number: 123"
        );
        let err = SearchError::invalid_query(&json!(["a"]));
        assert!(err.to_string().contains("received array: [\"a\"]"));
    }

    #[test]
    fn test_every_variant_is_an_error_outcome() {
        let errors = vec![
            SearchError::invalid_query(&json!(true)),
            SearchError::UnknownEngine("x".into()),
            SearchError::MissingCredential { provider: "OpenAI" },
            SearchError::InvalidResponse { api: "Brave API" },
            SearchError::Transport {
                backend: "Brave",
                message: "timeout".into(),
            },
            SearchError::Agent("rate limited".into()),
            SearchError::NoEnginesConfigured,
            SearchError::Config("bad toml".into()),
        ];
        for err in errors {
            assert!(is_error_outcome(&err.to_string()), "{}", err);
        }
        assert!(!is_error_outcome("[{\"title\":\"Error handling in Rust\"}]"));
    }

    #[test]
    fn test_jsonrpc_codes() {
        let err = SearchError::UnknownEngine("nope".into()).to_jsonrpc_error();
        assert_eq!(err["code"], -32602);
        assert_eq!(err["data"]["kind"], "unknown_engine");
        let err = SearchError::Agent("boom".into()).to_jsonrpc_error();
        assert_eq!(err["code"], -32603);
    }
}
