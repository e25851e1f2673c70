use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

use super::{base, header, ProviderCall};
use crate::agent::{AgentRequest, Role};

const MAX_TOKENS: u32 = 4096;

pub(crate) fn build(request: &AgentRequest, endpoint: &str) -> Result<ProviderCall, String> {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", header(&request.api_key)?);
    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

    let messages: Vec<Value> = request
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
        "max_tokens": MAX_TOKENS,
        "system": request.instructions,
        "messages": messages,
    });
    if let Some(tool) = request.signal_tool {
        body["tools"] = json!([{
            "type": "web_search_20250305",
            "name": tool.name,
            "max_uses": request.max_results.unwrap_or(5).clamp(1, 10),
        }]);
    }
    if let Some(caller) = &request.caller_agent_id {
        body["metadata"] = json!({ "user_id": caller });
    }

    Ok(ProviderCall {
        url: format!("{}/v1/messages", base(endpoint)),
        headers,
        body,
    })
}

/// `content[]` blocks of type `text`, in order.
pub(crate) fn extract(value: &Value) -> Vec<String> {
    value
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
