//! Anthropic Messages API client.
//!
//! Implements [`CompletionProvider`] with a single non-streaming
//! `POST /v1/messages` call carrying one user message.

use async_trait::async_trait;
use serde::Deserialize;

use super::error::LlmError;
use super::provider::CompletionProvider;

// ── Configuration ──────────────────────────────────────────────

/// Configuration for the Anthropic client.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Anthropic API key.
    pub api_key: String,
    /// Base URL for the API (defaults to `https://api.anthropic.com`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API version header value.
    pub api_version: String,
}

impl AnthropicConfig {
    /// Create a new Anthropic config.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            model: model.into(),
            api_version: "2023-06-01".to_string(),
        }
    }

    /// Set the base URL (useful for testing with mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

// ── Request / Response ─────────────────────────────────────────

/// Build an Anthropic Messages API request body for one user prompt.
pub fn build_messages_request(model: &str, prompt: &str, max_tokens: usize) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [
            {"role": "user", "content": prompt}
        ],
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Extract the first text block from a Messages API response body.
pub fn extract_text(body: &str) -> Result<String, LlmError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::ResponseError(format!("unreadable response envelope: {e}")))?;

    response
        .content
        .into_iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| LlmError::ResponseError("response contained no text block".into()))
}

// ── Error Mapping ──────────────────────────────────────────────

/// Map HTTP error responses to typed errors.
pub fn map_http_error(status: reqwest::StatusCode, body: &str) -> LlmError {
    let detail = extract_error_message(body);

    match status.as_u16() {
        401 | 403 => LlmError::AuthError(detail),
        429 => LlmError::RequestError(format!("rate limit exceeded: {detail}")),
        400 => LlmError::RequestError(detail),
        529 => LlmError::ProviderError(format!("API overloaded: {detail}")),
        s if s >= 500 => LlmError::ProviderError(detail),
        _ => LlmError::RequestError(format!("HTTP {status}: {detail}")),
    }
}

/// Extract a human-readable error message from an Anthropic error response.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                "no response body".to_string()
            } else {
                body.chars().take(500).collect()
            }
        })
}

// ── Client ─────────────────────────────────────────────────────

/// Anthropic Messages API completion client.
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::ConfigError("Anthropic API key is not set".into()));
        }

        let body = build_messages_request(&self.config.model, prompt, max_tokens);
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            max_tokens,
            "sending request to Anthropic"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Anthropic request failed");
                LlmError::RequestError(format!("connection error: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::RequestError(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %text, "Anthropic request returned error");
            return Err(map_http_error(status, &text));
        }

        extract_text(&text)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn config_new_defaults() {
        let config = AnthropicConfig::new("sk-test", "claude-3-5-sonnet-20241022");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.api_version, "2023-06-01");
    }

    #[test]
    fn config_builder() {
        let config = AnthropicConfig::new("k", "m")
            .with_base_url("http://localhost:9999")
            .with_api_version("2024-01-01");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.api_version, "2024-01-01");
    }

    #[test]
    fn request_body_shape() {
        let body = build_messages_request("claude-3-5-sonnet-20241022", "Plan my day", 1024);
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Plan my day");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn extract_text_takes_first_text_block() {
        let body = r#"{"content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"[1]"},{"type":"text","text":"[2]"}]}"#;
        assert_eq!(extract_text(body).unwrap(), "[1]");
    }

    #[test]
    fn extract_text_without_text_block_fails() {
        let err = extract_text(r#"{"content":[]}"#).unwrap_err();
        assert_eq!(err.code(), "RESPONSE_INVALID");
    }

    #[test]
    fn extract_text_rejects_garbage_envelope() {
        let err = extract_text("<html>").unwrap_err();
        assert!(matches!(err, LlmError::ResponseError(_)));
    }

    #[test]
    fn http_error_mapping() {
        use reqwest::StatusCode;
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = map_http_error(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, LlmError::AuthError(ref m) if m == "invalid x-api-key"));

        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.message().contains("rate limit exceeded"));
        assert!(err.message().contains("no response body"));

        let err = map_http_error(StatusCode::from_u16(529).unwrap(), "busy");
        assert!(matches!(err, LlmError::ProviderError(ref m) if m.contains("overloaded")));

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream");
        assert!(matches!(err, LlmError::ProviderError(_)));

        let err = map_http_error(StatusCode::NOT_FOUND, "nope");
        assert!(err.message().starts_with("HTTP 404"));
    }

    #[tokio::test]
    async fn empty_api_key_is_config_error() {
        let client = AnthropicClient::new(AnthropicConfig::new("", "m"));
        let err = client.complete("hi", 10).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_INVALID");
    }
}
