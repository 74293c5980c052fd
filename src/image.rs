//! Image-request handler.
//!
//! Forwards a scene prompt to an external image-generation API and maps
//! the outcome to an HTTP status and JSON body. The upstream call sits
//! behind [`ImageUpstream`] so the handler runs without a network.

use serde_json::{Value, json};
use thiserror::Error;

pub const IMAGES_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";
pub const IMAGE_MODEL: &str = "gpt-image-1";
pub const IMAGE_SIZE: &str = "512x512";
pub const MIN_PROMPT_CHARS: usize = 5;
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The API answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),
}

pub trait ImageUpstream {
    fn generate(&self, api_key: &str, prompt: &str) -> Result<Value, UpstreamError>;
}

/// Blocking HTTP upstream.
pub struct HttpUpstream {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpUpstream {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl ImageUpstream for HttpUpstream {
    fn generate(&self, api_key: &str, prompt: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({
                "model": IMAGE_MODEL,
                "prompt": prompt,
                "size": IMAGE_SIZE,
            }))
            .send()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResponse {
    pub status: u16,
    pub body: Value,
}

impl ImageResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::new(status, json!({ "error": message }))
    }
}

/// Handles one image request: method check, server credential, prompt
/// validation, then a single upstream call with no retry.
pub fn handle_image_request(
    method: &str,
    body: Option<&Value>,
    api_key: Option<&str>,
    upstream: &dyn ImageUpstream,
) -> ImageResponse {
    if !method.eq_ignore_ascii_case("POST") {
        return ImageResponse::error(405, "Method not allowed");
    }

    let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
        log::error!("{} is not set", API_KEY_VAR);
        return ImageResponse::error(500, &format!("Server missing {}", API_KEY_VAR));
    };

    let prompt = body
        .and_then(|b| b.get("prompt"))
        .and_then(Value::as_str)
        .filter(|p| p.chars().count() >= MIN_PROMPT_CHARS);

    let Some(prompt) = prompt else {
        return ImageResponse::error(400, "Missing/invalid prompt");
    };

    log::debug!("Requesting image for a {}-char prompt", prompt.chars().count());

    match upstream.generate(api_key, prompt) {
        Ok(data) => {
            let item = data.get("data").and_then(|d| d.get(0));

            if let Some(b64) = item.and_then(|i| i.get("b64_json")).and_then(Value::as_str) {
                ImageResponse::new(200, json!({ "b64": b64 }))
            } else if let Some(url) = item.and_then(|i| i.get("url")).and_then(Value::as_str) {
                ImageResponse::new(200, json!({ "url": url }))
            } else {
                log::warn!("Image response had neither b64_json nor url");
                ImageResponse::error(500, "Unexpected image response format")
            }
        }
        Err(UpstreamError::Status { status, body }) => {
            log::warn!("Image API returned status {}", status);
            ImageResponse::new(500, json!({ "error": "OpenAI error", "detail": body }))
        }
        Err(UpstreamError::Transport(detail)) => {
            log::warn!("Image API request failed: {}", detail);
            ImageResponse::new(500, json!({ "error": "Server error", "detail": detail }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct MockUpstream {
        reply: RefCell<Option<Result<Value, UpstreamError>>>,
        calls: Cell<usize>,
    }

    impl MockUpstream {
        fn new(reply: Result<Value, UpstreamError>) -> Self {
            Self {
                reply: RefCell::new(Some(reply)),
                calls: Cell::new(0),
            }
        }
    }

    impl ImageUpstream for MockUpstream {
        fn generate(&self, _api_key: &str, _prompt: &str) -> Result<Value, UpstreamError> {
            self.calls.set(self.calls.get() + 1);
            self.reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(UpstreamError::Transport("exhausted".into())))
        }
    }

    fn body(prompt: &str) -> Value {
        json!({ "prompt": prompt })
    }

    #[test]
    fn test_short_prompt_rejected_before_upstream() {
        let upstream = MockUpstream::new(Ok(json!({})));
        let response = handle_image_request("POST", Some(&body("cat")), Some("key"), &upstream);

        assert_eq!(response.status, 400);
        assert_eq!(response.body, json!({ "error": "Missing/invalid prompt" }));
        assert_eq!(upstream.calls.get(), 0);
    }

    #[test]
    fn test_missing_prompt() {
        let upstream = MockUpstream::new(Ok(json!({})));
        let response = handle_image_request("POST", None, Some("key"), &upstream);
        assert_eq!(response.status, 400);

        let response =
            handle_image_request("POST", Some(&json!({ "prompt": 42 })), Some("key"), &upstream);
        assert_eq!(response.status, 400);
        assert_eq!(upstream.calls.get(), 0);
    }

    #[test]
    fn test_non_post_rejected() {
        let upstream = MockUpstream::new(Ok(json!({})));
        let response = handle_image_request("GET", Some(&body("a lantern")), Some("key"), &upstream);
        assert_eq!(response.status, 405);
        assert_eq!(upstream.calls.get(), 0);
    }

    #[test]
    fn test_missing_key() {
        let upstream = MockUpstream::new(Ok(json!({})));
        let response = handle_image_request("POST", Some(&body("a lantern")), None, &upstream);
        assert_eq!(response.status, 500);
        assert_eq!(response.body, json!({ "error": "Server missing OPENAI_API_KEY" }));

        let response = handle_image_request("POST", Some(&body("a lantern")), Some(""), &upstream);
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_b64_payload() {
        let upstream = MockUpstream::new(Ok(json!({ "data": [{ "b64_json": "aGVsbG8=" }] })));
        let response =
            handle_image_request("POST", Some(&body("a lantern in fog")), Some("key"), &upstream);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "b64": "aGVsbG8=" }));
        assert_eq!(upstream.calls.get(), 1);
    }

    #[test]
    fn test_url_payload() {
        let upstream =
            MockUpstream::new(Ok(json!({ "data": [{ "url": "https://img.example/1.png" }] })));
        let response =
            handle_image_request("post", Some(&body("a lantern in fog")), Some("key"), &upstream);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "url": "https://img.example/1.png" }));
    }

    #[test]
    fn test_unexpected_shape() {
        let upstream = MockUpstream::new(Ok(json!({ "data": [] })));
        let response =
            handle_image_request("POST", Some(&body("a lantern in fog")), Some("key"), &upstream);
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({ "error": "Unexpected image response format" })
        );
    }

    #[test]
    fn test_upstream_error_body_passed_through() {
        let upstream = MockUpstream::new(Err(UpstreamError::Status {
            status: 401,
            body: "{\"error\":\"bad key\"}".to_string(),
        }));
        let response =
            handle_image_request("POST", Some(&body("a lantern in fog")), Some("key"), &upstream);
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({ "error": "OpenAI error", "detail": "{\"error\":\"bad key\"}" })
        );
        assert_eq!(upstream.calls.get(), 1);
    }

    #[test]
    fn test_transport_error() {
        let upstream = MockUpstream::new(Err(UpstreamError::Transport("timed out".into())));
        let response =
            handle_image_request("POST", Some(&body("a lantern in fog")), Some("key"), &upstream);
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            json!({ "error": "Server error", "detail": "timed out" })
        );
    }
}
