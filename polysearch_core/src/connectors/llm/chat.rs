//! OpenAI-compatible chat completions (xAI and OpenRouter).

use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde_json::{json, Value};

use super::{header, ProviderCall};
use crate::agent::{AgentRequest, Role};
use crate::engines::Provider;

pub(crate) fn build(request: &AgentRequest, url: &str) -> Result<ProviderCall, String> {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        header(&format!("Bearer {}", request.api_key))?,
    );

    let mut messages = vec![json!({ "role": "system", "content": request.instructions })];
    messages.extend(request.messages.iter().map(|m| {
        let role = match m.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        json!({ "role": role, "content": m.content })
    }));

    let mut body = json!({
        "model": request.model,
        "messages": messages,
    });
    // xAI live search is switched on per request
    if request.provider == Provider::Xai && request.signal_tool.is_some() {
        body["search_parameters"] = json!({
            "mode": "on",
            "return_citations": true,
            "max_search_results": request.max_results.unwrap_or(5),
        });
    }
    if let Some(caller) = &request.caller_agent_id {
        body["user"] = json!(caller);
    }
    if request.provider == Provider::OpenRouter {
        headers.insert("X-Title", reqwest::header::HeaderValue::from_static("polysearch"));
    }

    Ok(ProviderCall {
        url: url.to_string(),
        headers,
        body,
    })
}

/// First choice's content, followed by a source list when the provider
/// returns top-level `citations`.
pub(crate) fn extract(value: &Value) -> Vec<String> {
    let answer = value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();

    let mut parts = vec![answer];
    let citations: Vec<&str> = value
        .get("citations")
        .and_then(|c| c.as_array())
        .map(|arr| arr.iter().filter_map(|c| c.as_str()).collect())
        .unwrap_or_default();
    if !citations.is_empty() && !parts[0].trim().is_empty() {
        let mut sources = String::from("\n\nSources:");
        for url in citations {
            sources.push_str("\n- ");
            sources.push_str(url);
        }
        parts.push(sources);
    }
    parts
}
