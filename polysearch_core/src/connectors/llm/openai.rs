use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::{json, Value};

use super::{base, header, ProviderCall};
use crate::agent::{AgentRequest, Role};

/// Responses API request. The signal tool becomes `web_search_preview`.
pub(crate) fn build(request: &AgentRequest, endpoint: &str) -> Result<ProviderCall, String> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        header(&format!("Bearer {}", request.api_key))?,
    );

    let input: Vec<Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            json!({ "role": role, "content": m.content })
        })
        .collect();

    let mut body = json!({
        "model": request.model,
        "instructions": request.instructions,
        "input": input,
    });
    if request.signal_tool.is_some() {
        body["tools"] = json!([{ "type": "web_search_preview" }]);
    }
    if let Some(caller) = &request.caller_agent_id {
        body["user"] = json!(caller);
    }

    Ok(ProviderCall {
        url: format!("{}/v1/responses", base(endpoint)),
        headers,
        body,
    })
}

pub(crate) fn extract(value: &Value) -> Vec<String> {
    if let Some(text) = value.get("output_text").and_then(|t| t.as_str()) {
        return vec![text.to_string()];
    }
    value
        .get("output")
        .and_then(|o| o.as_array())
        .map(|items| {
            items
                .iter()
                .filter(|i| i.get("type").and_then(|t| t.as_str()) == Some("message"))
                .filter_map(|i| i.get("content").and_then(|c| c.as_array()))
                .flatten()
                .filter(|c| c.get("type").and_then(|t| t.as_str()) == Some("output_text"))
                .filter_map(|c| c.get("text").and_then(|t| t.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
