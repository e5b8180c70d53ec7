//! Error types for the Spark relay.

use crate::llm::LlmError;

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum SparkError {
    /// Required request input is missing or unusable.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote language-model call failed.
    #[error("remote call error: {0}")]
    Remote(#[from] LlmError),

    /// Model output is not valid JSON or has the wrong shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP server error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SparkError {
    /// Whether the error is the caller's fault and maps to a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SparkError>;
