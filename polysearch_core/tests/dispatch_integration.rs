//! Dispatcher behaviour against a mocked Brave API.

use std::sync::Arc;

use polysearch_core::config::Endpoints;
use polysearch_core::{is_error_outcome, Credentials, Dispatcher, Provider, SearchConfig};
use serde_json::{json, Value};
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer, credentials: Credentials) -> Dispatcher {
    let config = SearchConfig {
        endpoints: Endpoints::all(server.uri()),
        request_timeout_secs: 5,
        ..SearchConfig::default()
    };
    Dispatcher::from_config(config, Arc::new(credentials)).unwrap()
}

fn brave() -> Credentials {
    Credentials::new().with(Provider::Brave, "test-brave-key")
}

#[tokio::test]
async fn test_web_search_returns_results_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(query_param("q", "rust programming"))
        .and(query_param("count", "3"))
        .and(header("X-Subscription-Token", "test-brave-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "search",
            "web": {"results": [
                {"title": "Rust", "url": "https://www.rust-lang.org/", "description": "A language empowering everyone."},
                {"title": "The Book", "url": "https://doc.rust-lang.org/book/", "description": "Learn Rust."},
                {"title": "crates.io", "url": "https://crates.io/", "description": "The Rust package registry."}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let out = dispatcher(&server, brave())
        .search("brave", "rust programming", 3)
        .await;
    let parsed: Value = serde_json::from_str(&out).unwrap();
    let results = parsed.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["title"], "Rust");
    assert_eq!(results[1]["url"], "https://doc.rust-lang.org/book/");
    assert_eq!(results[2]["snippet"], "The Rust package registry.");
    for r in results {
        assert!(!r["url"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let d = dispatcher(&server, Credentials::new());
    assert_eq!(
        d.search("brave", "sunset photo", 2).await,
        "Error: Brave API key not configured."
    );
    assert_eq!(
        d.search("brave-images", "sunset photo", 2).await,
        "Error: Brave API key not configured."
    );
    assert_eq!(
        d.search("anthropic", "latest news", 5).await,
        "Error: Anthropic API key not configured."
    );
}

#[tokio::test]
async fn test_non_string_query_from_tool_call() {
    let server = MockServer::start().await;
    let d = dispatcher(&server, brave());
    let args = json!({"engine": "brave", "query": 123, "num_results": 5});
    let out = polysearch_core::types::outcome_to_legacy(
        d.dispatch_tool_args(args.as_object().unwrap(), None).await,
    );
    assert!(out.starts_with("Error: Search query must be a string"));
}

#[tokio::test]
async fn test_unknown_engine_exact_message() {
    let server = MockServer::start().await;
    let d = dispatcher(&server, brave());
    assert_eq!(
        d.search("unknown-engine", "q", 5).await,
        "Error: Invalid or unsupported search engine unknown-engine"
    );
}

#[tokio::test]
async fn test_image_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/v1/images/search"))
        .and(query_param("q", "sunset photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "images",
            "results": [
                {
                    "url": "https://img.example/sunset.jpg",
                    "properties": {"url": "https://img.example/sunset-full.jpg", "width": "1920", "height": 1080}
                },
                {
                    "title": "Beach sunset",
                    "url": "https://img.example/beach.jpg",
                    "thumbnail": {"src": "https://imgs.search.brave.com/beach-thumb.jpg"},
                    "source": "example.com"
                }
            ]
        })))
        .mount(&server)
        .await;

    let out = dispatcher(&server, brave())
        .search("brave-images", "sunset photo", 2)
        .await;
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed[0]["title"], "Untitled");
    assert_eq!(parsed[0]["thumbnail"], "https://img.example/sunset.jpg");
    assert_eq!(parsed[0]["source"], "Unknown");
    assert_eq!(parsed[0]["width"], 1920);
    assert_eq!(parsed[0]["height"], 1080);
    assert_eq!(parsed[1]["title"], "Beach sunset");
    assert_eq!(
        parsed[1]["thumbnail"],
        "https://imgs.search.brave.com/beach-thumb.jpg"
    );
    assert!(parsed[1].get("width").is_none());
}

#[tokio::test]
async fn test_unexpected_shape_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "search"})))
        .mount(&server)
        .await;
    Mock::given(path("/res/v1/images/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "images"})))
        .mount(&server)
        .await;

    let d = dispatcher(&server, brave());
    assert_eq!(
        d.search("brave", "q", 5).await,
        "Error: Received an invalid response structure from Brave API."
    );
    assert_eq!(
        d.search("brave-images", "q", 5).await,
        "Error: Received an invalid response structure from Brave Image API."
    );
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/res/v1/images/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let d = dispatcher(&server, brave());
    let out = d.search("brave", "q", 5).await;
    assert!(out.starts_with("Error performing Brave search: HTTP 429"), "{}", out);
    assert!(out.contains("rate limited"));
    assert!(is_error_outcome(&out));

    let out = d.search("brave-images", "q", 5).await;
    assert!(out.starts_with("Error performing Brave image search: "), "{}", out);
}

#[tokio::test]
async fn test_count_is_clamped_for_brave() {
    let server = MockServer::start().await;
    Mock::given(path("/res/v1/web/search"))
        .and(query_param("count", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"web": {"results": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let out = dispatcher(&server, brave()).search("brave", "q", 50).await;
    assert_eq!(out, "[]");
}

#[tokio::test]
async fn test_repeated_dispatch_is_identical() {
    let server = MockServer::start().await;
    Mock::given(path("/res/v1/web/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "web": {"results": [
                {"title": "a", "url": "https://a.example", "description": "1"},
                {"title": "b", "url": "https://b.example", "description": "2"}
            ]}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let d = dispatcher(&server, brave());
    let first = d.search("brave", "q", 2).await;
    let second = d.search("brave", "q", 2).await;
    assert_eq!(first, second);
}
