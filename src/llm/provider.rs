//! Completion provider trait.
//!
//! The relay treats the remote model as an opaque capability: one prompt
//! in, free text out (expected, but not guaranteed, to be JSON).

use async_trait::async_trait;

use super::error::LlmError;

/// Trait for remote completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the provider name (e.g. `"anthropic"`).
    fn name(&self) -> &str;

    /// Send a single user prompt and return the model's text reply.
    ///
    /// Exactly one attempt is made; callers decide what a failure means.
    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, LlmError>;
}
