//! Error types for the completion provider layer.
//!
//! Each error variant carries a stable error code (SCREAMING_SNAKE_CASE)
//! that is included in the Display output and accessible via [`LlmError::code()`].

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing provider configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// Authentication failed (invalid/missing API key).
    pub const AUTH_FAILED: &str = "AUTH_FAILED";

    /// Request to the LLM provider failed (connection, rate limit, bad request).
    pub const REQUEST_FAILED: &str = "REQUEST_FAILED";

    /// Provider-side failure (5xx, overloaded).
    pub const PROVIDER_ERROR: &str = "PROVIDER_ERROR";

    /// Provider answered, but the envelope carried no usable text.
    pub const RESPONSE_INVALID: &str = "RESPONSE_INVALID";
}

/// Errors produced by a [`CompletionProvider`](super::CompletionProvider).
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Invalid or missing provider configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    ConfigError(String),

    /// Authentication failed (invalid/missing API key).
    #[error("[{}] {}", error_codes::AUTH_FAILED, .0)]
    AuthError(String),

    /// Request to the LLM provider failed.
    #[error("[{}] {}", error_codes::REQUEST_FAILED, .0)]
    RequestError(String),

    /// Provider-specific failure not covered by other variants.
    #[error("[{}] {}", error_codes::PROVIDER_ERROR, .0)]
    ProviderError(String),

    /// The response envelope could not be read.
    #[error("[{}] {}", error_codes::RESPONSE_INVALID, .0)]
    ResponseError(String),
}

impl LlmError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => error_codes::CONFIG_INVALID,
            Self::AuthError(_) => error_codes::AUTH_FAILED,
            Self::RequestError(_) => error_codes::REQUEST_FAILED,
            Self::ProviderError(_) => error_codes::PROVIDER_ERROR,
            Self::ResponseError(_) => error_codes::RESPONSE_INVALID,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::ConfigError(m)
            | Self::AuthError(m)
            | Self::RequestError(m)
            | Self::ProviderError(m)
            | Self::ResponseError(m) => m,
        }
    }
}
