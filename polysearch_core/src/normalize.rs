//! Brave response bodies → uniform records.
//!
//! Order is preserved and nothing is truncated. Entries without a url are
//! dropped.

use serde_json::Value;

use crate::error::SearchError;
use crate::types::{ImageSearchResult, SearchResult};

pub const BRAVE_WEB_API: &str = "Brave API";
pub const BRAVE_IMAGE_API: &str = "Brave Image API";

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// `web.results[]` → `{title, url, snippet}`.
pub fn brave_web_results(body: &Value) -> Result<Vec<SearchResult>, SearchError> {
    let entries = body
        .get("web")
        .and_then(|w| w.get("results"))
        .and_then(|r| r.as_array())
        .ok_or(SearchError::InvalidResponse { api: BRAVE_WEB_API })?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let url = str_field(entry, "url")?;
            Some(SearchResult {
                title: str_field(entry, "title").unwrap_or_default().to_string(),
                url: url.to_string(),
                snippet: str_field(entry, "description")
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect())
}

/// `results[]` → `{title, url, thumbnail, source, width?, height?}`.
pub fn brave_image_results(body: &Value) -> Result<Vec<ImageSearchResult>, SearchError> {
    let entries = body
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or(SearchError::InvalidResponse {
            api: BRAVE_IMAGE_API,
        })?;

    Ok(entries.iter().filter_map(normalize_image).collect())
}

fn normalize_image(entry: &Value) -> Option<ImageSearchResult> {
    let properties = entry.get("properties");
    let url = str_field(entry, "url").or_else(|| properties.and_then(|p| str_field(p, "url")))?;
    let thumbnail = entry
        .get("thumbnail")
        .and_then(|t| str_field(t, "src"))
        .unwrap_or(url);

    Some(ImageSearchResult {
        title: str_field(entry, "title").unwrap_or("Untitled").to_string(),
        url: url.to_string(),
        thumbnail: thumbnail.to_string(),
        source: str_field(entry, "source").unwrap_or("Unknown").to_string(),
        width: properties.and_then(|p| dimension(p, "width")),
        height: properties.and_then(|p| dimension(p, "height")),
    })
}

// Brave sends dimensions as numbers, occasionally as numeric strings.
fn dimension(properties: &Value, key: &str) -> Option<u64> {
    match properties.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_web_results_keep_order_and_count() {
        let body = json!({
            "type": "search",
            "web": {
                "type": "search",
                "results": [
                    {"title": "The Rust Programming Language", "url": "https://doc.rust-lang.org/book/", "description": "The book."},
                    {"title": "Rust by Example", "url": "https://doc.rust-lang.org/rust-by-example/", "description": "Examples."},
                    {"title": "Rustlings", "url": "https://github.com/rust-lang/rustlings", "description": "Exercises."}
                ]
            }
        });
        let results = brave_web_results(&body).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "The Rust Programming Language");
        assert_eq!(results[1].url, "https://doc.rust-lang.org/rust-by-example/");
        assert_eq!(results[2].snippet, "Exercises.");
    }

    #[test]
    fn test_web_missing_nested_shape_is_invalid() {
        for body in [
            json!({}),
            json!({"web": {}}),
            json!({"web": {"results": "nope"}}),
            json!({"results": []}),
        ] {
            let err = brave_web_results(&body).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Error: Received an invalid response structure from Brave API."
            );
        }
    }

    #[test]
    fn test_web_empty_results_is_ok() {
        let results = brave_web_results(&json!({"web": {"results": []}})).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_web_entry_without_url_is_skipped() {
        let body = json!({"web": {"results": [
            {"title": "no link", "description": "x"},
            {"title": "ok", "url": "https://example.com", "description": "y"}
        ]}});
        let results = brave_web_results(&body).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "ok");
    }

    #[test]
    fn test_image_defaults() {
        let body = json!({"results": [
            {"url": "https://img.example/a.jpg"},
            {
                "title": "Golden hour",
                "url": "https://img.example/b.jpg",
                "source": "photos.example",
                "thumbnail": {"src": "https://thumbs.example/b.jpg"},
                "properties": {"url": "https://cdn.example/b-full.jpg", "width": 1920, "height": "1080"}
            }
        ]});
        let images = brave_image_results(&body).unwrap();
        assert_eq!(images.len(), 2);

        assert_eq!(images[0].title, "Untitled");
        assert_eq!(images[0].thumbnail, "https://img.example/a.jpg");
        assert_eq!(images[0].source, "Unknown");
        assert_eq!(images[0].width, None);
        assert_eq!(images[0].height, None);

        assert_eq!(images[1].title, "Golden hour");
        assert_eq!(images[1].url, "https://img.example/b.jpg");
        assert_eq!(images[1].thumbnail, "https://thumbs.example/b.jpg");
        assert_eq!(images[1].width, Some(1920));
        assert_eq!(images[1].height, Some(1080));
    }

    #[test]
    fn test_image_url_falls_back_to_properties() {
        let body = json!({"results": [
            {"title": "t", "properties": {"url": "https://cdn.example/full.png"}}
        ]});
        let images = brave_image_results(&body).unwrap();
        assert_eq!(images[0].url, "https://cdn.example/full.png");
        assert_eq!(images[0].thumbnail, "https://cdn.example/full.png");
    }

    #[test]
    fn test_image_missing_results_is_invalid() {
        let err = brave_image_results(&json!({"web": {"results": []}})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Received an invalid response structure from Brave Image API."
        );
    }
}
