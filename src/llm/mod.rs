//! Remote language-model access.
//!
//! - [`provider`]: the [`CompletionProvider`] capability trait
//! - [`anthropic`]: Anthropic Messages API implementation
//! - [`error`]: error types with stable error codes

pub mod anthropic;
pub mod error;
pub mod provider;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use error::LlmError;
pub use provider::CompletionProvider;
