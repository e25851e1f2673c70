//! Provider HTTP APIs behind the [`AgentRuntime`] seam.
//!
//! Each provider module builds one request and pulls the text parts out of
//! the response. Responses are read whole and replayed as agent events.

mod anthropic;
mod chat;
mod gemini;
mod openai;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::agent::{AgentEvent, AgentRequest, AgentRuntime};
use crate::config::Endpoints;
use crate::engines::Provider;

pub(crate) struct ProviderCall {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct HttpAgentRuntime {
    client: Client,
    endpoints: Endpoints,
}

impl HttpAgentRuntime {
    pub fn new(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    fn build_call(&self, request: &AgentRequest) -> Result<ProviderCall, String> {
        match request.provider {
            Provider::Anthropic => anthropic::build(request, &self.endpoints.anthropic),
            Provider::OpenAi => openai::build(request, &self.endpoints.openai),
            Provider::Google => gemini::build(request, &self.endpoints.google),
            Provider::Xai => chat::build(
                request,
                &format!("{}/v1/chat/completions", base(&self.endpoints.xai)),
            ),
            Provider::OpenRouter => chat::build(
                request,
                &format!("{}/api/v1/chat/completions", base(&self.endpoints.openrouter)),
            ),
            Provider::Brave => Err("Brave is not a model provider".to_string()),
        }
    }

    /// One round trip; `Ok` holds the text parts in order.
    async fn complete(&self, request: &AgentRequest) -> Result<Vec<String>, String> {
        let call = self.build_call(request)?;
        let provider = request.provider;

        let resp = self
            .client
            .post(&call.url)
            .headers(call.headers)
            .json(&call.body)
            .send()
            .await
            .map_err(|e| format!("{} request failed: {}", provider, e))?;

        let status = resp.status();
        debug!(%status, %provider, model = %request.model, "provider response");
        let text = resp
            .text()
            .await
            .map_err(|e| format!("{} response could not be read: {}", provider, e))?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            return Err(format!(
                "{} API error: {} - {}",
                provider,
                status,
                error_message(&value)
            ));
        }

        Ok(match provider {
            Provider::Anthropic => anthropic::extract(&value),
            Provider::OpenAi => openai::extract(&value),
            Provider::Google => gemini::extract(&value),
            _ => chat::extract(&value),
        })
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn stream(&self, request: AgentRequest) -> BoxStream<'static, AgentEvent> {
        let events = match self.complete(&request).await {
            Ok(parts) => parts
                .into_iter()
                .filter(|p| !p.is_empty())
                .map(AgentEvent::TextDelta)
                .chain(std::iter::once(AgentEvent::Completed(None)))
                .collect(),
            Err(message) => vec![AgentEvent::Error(message)],
        };
        stream::iter(events).boxed()
    }
}

pub(crate) fn base(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn error_message(value: &Value) -> String {
    let message = value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|m| m.as_str().map(str::to_string))
        .unwrap_or_else(|| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    message.chars().take(500).collect()
}

pub(crate) fn header(value: &str) -> Result<reqwest::header::HeaderValue, String> {
    reqwest::header::HeaderValue::from_str(value).map_err(|e| format!("invalid header: {}", e))
}
