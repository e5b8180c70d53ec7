//! Shared test utilities used across multiple test modules.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionProvider, LlmError};

/// A [`CompletionProvider`] that replays queued replies and records prompts.
///
/// Once the queue is drained, every call repeats the last reply.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Option<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    max_tokens: Mutex<Vec<usize>>,
}

impl ScriptedProvider {
    /// Provider answering with each text in order.
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(replies.into_iter().map(|r| Ok(r.into())))
    }

    /// Provider whose every call fails with `error`.
    pub fn failing(error: LlmError) -> Self {
        Self::scripted([Err(error)])
    }

    /// Provider replaying an arbitrary sequence of outcomes.
    pub fn scripted<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Self {
            replies: Mutex::new(outcomes.into_iter().collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            max_tokens: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    /// `max_tokens` values received so far.
    pub fn max_tokens_seen(&self) -> Vec<usize> {
        self.max_tokens.lock().expect("max_tokens lock").clone()
    }

    /// Number of completed calls.
    pub fn calls(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_owned());
        self.max_tokens
            .lock()
            .expect("max_tokens lock")
            .push(max_tokens);

        let next = self.replies.lock().expect("replies lock").pop_front();
        let mut last = self.last.lock().expect("last lock");
        match next {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(LlmError::ResponseError("script exhausted".into()))),
        }
    }
}
