//! A scripted completion model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use docqa_rag::{CompletionError, CompletionModel};

/// Replays scripted replies in order, then falls back to a fixed reply.
///
/// Every prompt it receives is recorded, which makes it convenient for
/// asserting on what the pipeline sent.
///
/// ```rust
/// use docqa_model::MockCompletionModel;
/// use docqa_rag::CompletionError;
///
/// let model = MockCompletionModel::new("fallback")
///     .then_fail(CompletionError::Network("offline".into()))
///     .then_reply("scripted");
/// assert_eq!(model.call_count(), 0);
/// ```
#[derive(Debug)]
pub struct MockCompletionModel {
    name: String,
    fallback: Result<String, CompletionError>,
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletionModel {
    /// A model that answers every prompt with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            fallback: Ok(reply.into()),
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model that fails every prompt with `error`.
    pub fn failing(error: CompletionError) -> Self {
        Self { fallback: Err(error), ..Self::new("") }
    }

    /// Builds the reply from the prompt's question line, prefixed with "Echo: ".
    ///
    /// Useful for offline runs where any deterministic answer will do.
    pub fn echo() -> EchoCompletionModel {
        EchoCompletionModel
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a successful reply ahead of the fallback.
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(reply.into()));
        self
    }

    /// Queue a failure ahead of the fallback.
    pub fn then_fail(self, error: CompletionError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl CompletionModel for MockCompletionModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.script).pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Answers with the question found in the prompt; see [`MockCompletionModel::echo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoCompletionModel;

#[async_trait]
impl CompletionModel for EchoCompletionModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let question = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or(prompt)
            .trim();
        Ok(format!("Echo: {question}"))
    }
}

// A poisoned lock only means another test thread panicked mid-push.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let model = MockCompletionModel::new("fallback")
            .then_fail(CompletionError::RateLimited("busy".into()))
            .then_reply("first");

        assert_eq!(model.complete("a").await, Err(CompletionError::RateLimited("busy".into())));
        assert_eq!(model.complete("b").await, Ok("first".to_string()));
        assert_eq!(model.complete("c").await, Ok("fallback".to_string()));
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failing_model() {
        let model = MockCompletionModel::failing(CompletionError::Network("down".into()));
        assert!(model.complete("x").await.is_err());
        assert!(model.complete("y").await.is_err());
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_echo_uses_question_line() {
        let answer = MockCompletionModel::echo()
            .complete("context here\n\nQuestion: what is it?\nHelpful Answer:")
            .await
            .unwrap();
        assert_eq!(answer, "Echo: what is it?");
    }
}
