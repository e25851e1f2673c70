use reqwest::header::HeaderMap;
use serde_json::{json, Value};

use super::{base, header, ProviderCall};
use crate::agent::{AgentRequest, Role};

pub(crate) fn build(request: &AgentRequest, endpoint: &str) -> Result<ProviderCall, String> {
    let mut headers = HeaderMap::new();
    headers.insert("x-goog-api-key", header(&request.api_key)?);

    let contents: Vec<Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({ "role": role, "parts": [ { "text": m.content } ] })
        })
        .collect();

    let mut body = json!({
        "systemInstruction": { "parts": [ { "text": request.instructions } ] },
        "contents": contents,
    });
    if request.signal_tool.is_some() {
        body["tools"] = json!([{ "google_search": {} }]);
    }

    Ok(ProviderCall {
        url: format!(
            "{}/v1beta/models/{}:generateContent",
            base(endpoint),
            request.model
        ),
        headers,
        body,
    })
}

/// `candidates[0].content.parts[].text`.
pub(crate) fn extract(value: &Value) -> Vec<String> {
    value
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("content"))
        .and_then(|ct| ct.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
