use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::SearchError;
use crate::normalize::{brave_image_results, brave_web_results};
use crate::types::{ImageSearchResult, SearchResult};

const WEB_BACKEND: &str = "Brave";
const IMAGE_BACKEND: &str = "Brave image";

// Upper bounds Brave accepts for `count`.
const WEB_MAX_COUNT: u32 = 20;
const IMAGE_MAX_COUNT: u32 = 100;

/// Direct keyword search. One request per call, no retries.
#[async_trait]
pub trait KeywordSearch: Send + Sync {
    async fn web(
        &self,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<SearchResult>, SearchError>;

    async fn images(
        &self,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<ImageSearchResult>, SearchError>;
}

pub struct BraveClient {
    client: Client,
    base_url: String,
}

impl BraveClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_headers(api_key: &str, backend: &'static str) -> Result<HeaderMap, SearchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Subscription-Token",
            HeaderValue::from_str(api_key).map_err(|e| SearchError::Transport {
                backend,
                message: format!("invalid API key header: {}", e),
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// GET `{base}{path}` and decode the JSON body. Anything short of a 2xx
    /// JSON body is a transport failure for `backend`.
    async fn get_json(
        &self,
        path: &str,
        api_key: &str,
        query: &str,
        count: u32,
        backend: &'static str,
    ) -> Result<Value, SearchError> {
        let transport = |message: String| SearchError::Transport { backend, message };

        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .headers(Self::build_headers(api_key, backend)?)
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = resp.status();
        debug!(%status, path, "brave response");
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(transport(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| transport(e.to_string()))
    }
}

#[async_trait]
impl KeywordSearch for BraveClient {
    async fn web(
        &self,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let count = count.clamp(1, WEB_MAX_COUNT);
        let body = self
            .get_json("/res/v1/web/search", api_key, query, count, WEB_BACKEND)
            .await?;
        brave_web_results(&body)
    }

    async fn images(
        &self,
        api_key: &str,
        query: &str,
        count: u32,
    ) -> Result<Vec<ImageSearchResult>, SearchError> {
        let count = count.clamp(1, IMAGE_MAX_COUNT);
        let body = self
            .get_json("/res/v1/images/search", api_key, query, count, IMAGE_BACKEND)
            .await?;
        brave_image_results(&body)
    }
}
