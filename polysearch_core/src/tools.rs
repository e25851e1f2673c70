//! The search dispatcher as an agent-callable tool.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{CallToolRequestParam, CallToolResult, IntoContents, Tool};
use serde_json::{json, Map, Value};

use crate::credentials::Credentials;
use crate::dispatch::Dispatcher;
use crate::engines::engine_descriptions;
use crate::error::{is_error_outcome, SearchError};
use crate::types::{outcome_to_legacy, DEFAULT_NUM_RESULTS};

pub const SEARCH_TOOL_NAME: &str = "web_search";

/// Tool descriptors for the currently enabled engines.
///
/// Empty when no engine is configured; an empty `enum` is never exposed.
pub fn list_search_tools(credentials: &Credentials) -> Vec<Tool> {
    let engines = engine_descriptions(credentials);
    if engines.is_empty() {
        return Vec::new();
    }

    let names: Vec<&str> = engines.iter().map(|(id, _)| id.as_str()).collect();
    let mut description = String::from(
        "Search the web with one of the configured engines. \
Keyword engines return a JSON array of results; LLM engines return a written answer.\n\nEngines:",
    );
    for (id, text) in &engines {
        description.push_str(&format!("\n- {}: {}", id, text));
    }

    let schema = json!({
        "type": "object",
        "properties": {
            "engine": {
                "type": "string",
                "enum": names,
                "description": "Search engine to use"
            },
            "query": {"type": "string", "description": "Search query"},
            "num_results": {
                "type": "integer",
                "minimum": 1,
                "default": DEFAULT_NUM_RESULTS,
                "description": "Number of results (a hint for LLM engines)"
            }
        },
        "required": ["engine", "query"],
        "additionalProperties": false
    });
    let input_schema = match schema {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    vec![Tool {
        name: Cow::Borrowed(SEARCH_TOOL_NAME),
        title: None,
        description: Some(Cow::Owned(description)),
        input_schema: Arc::new(input_schema),
        output_schema: None,
        annotations: None,
        icons: None,
    }]
}

/// Run a `web_search` tool call. The text content is the legacy outcome
/// string; `is_error` mirrors it.
pub async fn call_search_tool(
    dispatcher: &Dispatcher,
    request: CallToolRequestParam,
    caller_agent_id: Option<&str>,
) -> Result<CallToolResult, SearchError> {
    if request.name != SEARCH_TOOL_NAME {
        return Err(SearchError::UnknownTool(request.name.to_string()));
    }
    let args = request.arguments.unwrap_or_default();
    let text = outcome_to_legacy(dispatcher.dispatch_tool_args(&args, caller_agent_id).await);

    Ok(if is_error_outcome(&text) {
        CallToolResult::error(text.into_contents())
    } else {
        CallToolResult::success(text.into_contents())
    })
}
