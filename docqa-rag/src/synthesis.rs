//! Answer synthesis: one prompt, one completion, typed failures.
//!
//! All retrieved context is "stuffed" into a single prompt together with the
//! question. Whatever goes wrong in the backend call is reported as a
//! [`SynthesisFailure`] for that question only; the session and its index stay
//! usable.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::completion::{CompletionError, CompletionModel};
use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// Prefix used when a failure has to be shown as plain answer text.
pub const ERROR_MARKER: &str = "Error during answering: ";

const DEFAULT_TEMPLATE: &str = "Use the following pieces of context to answer the question at \
the end. If you don't know the answer, just say that you don't know, don't try to make up an \
answer.\n\n{context}\n\nQuestion: {question}\nHelpful Answer:";

/// Why no answer could be produced for a question.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisFailure {
    /// The completion backend reported an error.
    #[error("completion backend failed: {0}")]
    Backend(#[from] CompletionError),

    /// The backend did not answer within the configured timeout.
    #[error("no response from the completion backend after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The backend answered with nothing but whitespace.
    #[error("the completion backend returned an empty answer")]
    EmptyAnswer,
}

impl SynthesisFailure {
    /// Render the failure the way a plain-text display shows it, starting
    /// with [`ERROR_MARKER`].
    pub fn to_display_string(&self) -> String {
        format!("{ERROR_MARKER}{self}")
    }
}

/// A prompt with `{context}` and `{question}` placeholders.
///
/// Substitution is single-pass: placeholder-like text inside the context or
/// the question is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if either placeholder is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in ["{context}", "{question}"] {
            if !template.contains(placeholder) {
                return Err(RagError::ConfigError(format!(
                    "prompt template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Substitute the placeholders.
    pub fn render(&self, context: &str, question: &str) -> String {
        self.template
            .split("{context}")
            .map(|piece| piece.replace("{question}", question))
            .collect::<Vec<_>>()
            .join(context)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

/// Join retrieved chunk texts with newlines, in rank order.
///
/// With a `max_chars` budget, chunks are added whole while they fit (the
/// newline separators count toward the budget). The top-ranked chunk is always
/// present, truncated at a character boundary if it alone exceeds the budget.
pub fn assemble_context(results: &[SearchResult], max_chars: Option<usize>) -> String {
    let Some(budget) = max_chars else {
        return results.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n");
    };

    let mut context = String::new();
    let mut used = 0;
    for (rank, result) in results.iter().enumerate() {
        let text = result.chunk.text.as_str();
        let len = text.chars().count();
        if rank == 0 {
            if len > budget {
                return text.chars().take(budget).collect();
            }
            context.push_str(text);
            used = len;
            continue;
        }
        if used + 1 + len > budget {
            break;
        }
        context.push('\n');
        context.push_str(text);
        used += 1 + len;
    }
    context
}

/// Produces an answer from a question and its retrieved context.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docqa_rag::AnswerSynthesizer;
///
/// let synthesizer = AnswerSynthesizer::new(Arc::new(model));
/// match synthesizer.synthesize(&context, "What is the summary?").await {
///     Ok(answer) => println!("{answer}"),
///     Err(failure) => eprintln!("{}", failure.to_display_string()),
/// }
/// ```
#[derive(Clone)]
pub struct AnswerSynthesizer {
    model: Arc<dyn CompletionModel>,
    template: PromptTemplate,
    timeout: Duration,
}

impl AnswerSynthesizer {
    /// Create a synthesizer with the default prompt and a 60 second timeout.
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model, template: PromptTemplate::default(), timeout: Duration::from_secs(60) }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &Arc<dyn CompletionModel> {
        &self.model
    }

    /// Ask the model to answer `question` from `context`.
    ///
    /// The returned answer is trimmed. Every backend problem, including a
    /// timeout, comes back as `Err(SynthesisFailure)`; nothing is retried.
    pub async fn synthesize(
        &self,
        context: &str,
        question: &str,
    ) -> std::result::Result<String, SynthesisFailure> {
        let prompt = self.template.render(context, question);
        debug!(model = self.model.name(), prompt_len = prompt.len(), "requesting completion");

        let response = match tokio::time::timeout(self.timeout, self.model.complete(&prompt)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(model = self.model.name(), error = %e, "completion failed");
                return Err(SynthesisFailure::Backend(e));
            }
            Err(_) => {
                warn!(model = self.model.name(), timeout = ?self.timeout, "completion timed out");
                return Err(SynthesisFailure::Timeout { after: self.timeout });
            }
        };

        let answer = response.trim();
        if answer.is_empty() {
            warn!(model = self.model.name(), "completion was empty");
            return Err(SynthesisFailure::EmptyAnswer);
        }

        info!(model = self.model.name(), answer_len = answer.len(), "answer synthesized");
        Ok(answer.to_string())
    }
}

impl std::fmt::Debug for AnswerSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerSynthesizer")
            .field("model", &self.model.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::document::TextChunk;

    /// Replies with a fixed result and remembers the last prompt.
    struct FixedModel {
        reply: std::result::Result<String, CompletionError>,
        last_prompt: Mutex<Option<String>>,
    }

    impl FixedModel {
        fn new(reply: std::result::Result<String, CompletionError>) -> Arc<Self> {
            Arc::new(Self { reply, last_prompt: Mutex::new(None) })
        }
    }

    #[async_trait]
    impl CompletionModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone()
        }
    }

    struct SlowModel;

    #[async_trait]
    impl CompletionModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _prompt: &str) -> std::result::Result<String, CompletionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn results(texts: &[&str]) -> Vec<SearchResult> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| SearchResult { chunk: TextChunk::new(i, *t), distance: i as f32 })
            .collect()
    }

    #[test]
    fn test_default_prompt_contains_context_and_question() {
        let prompt = PromptTemplate::default().render("the sky is blue", "what colour is the sky?");
        assert!(prompt.contains("the sky is blue\n\nQuestion: what colour is the sky?"));
        assert!(prompt.ends_with("Helpful Answer:"));
    }

    #[test]
    fn test_render_is_single_pass() {
        let template = PromptTemplate::new("C={context} Q={question}").unwrap();
        assert_eq!(template.render("{question}", "{context}"), "C={question} Q={context}");
    }

    #[test]
    fn test_template_requires_placeholders() {
        assert!(PromptTemplate::new("only {context}").is_err());
        assert!(PromptTemplate::new("only {question}").is_err());
    }

    #[test]
    fn test_assemble_context_unbounded() {
        assert_eq!(assemble_context(&results(&["a", "b", "c"]), None), "a\nb\nc");
        assert_eq!(assemble_context(&[], None), "");
    }

    #[test]
    fn test_assemble_context_budget_keeps_whole_chunks() {
        let ranked = results(&["aaaa", "bbbb", "cc"]);
        assert_eq!(assemble_context(&ranked, Some(9)), "aaaa\nbbbb");
        assert_eq!(assemble_context(&ranked, Some(8)), "aaaa");
        assert_eq!(assemble_context(&ranked, Some(2)), "aa");
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let model = FixedModel::new(Ok("  Paris.\n".into()));
        let synthesizer = AnswerSynthesizer::new(model.clone());
        let answer = synthesizer.synthesize("France's capital is Paris.", "Capital?").await;
        assert_eq!(answer.unwrap(), "Paris.");
        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("France's capital is Paris."));
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure() {
        let model = FixedModel::new(Err(CompletionError::Network("connection refused".into())));
        let synthesizer = AnswerSynthesizer::new(model);
        let failure = synthesizer.synthesize("ctx", "q").await.unwrap_err();
        assert_eq!(
            failure,
            SynthesisFailure::Backend(CompletionError::Network("connection refused".into()))
        );
        assert!(failure.to_display_string().starts_with(ERROR_MARKER));
    }

    #[tokio::test]
    async fn test_empty_answer_is_failure() {
        let synthesizer = AnswerSynthesizer::new(FixedModel::new(Ok(" \n ".into())));
        let failure = synthesizer.synthesize("ctx", "q").await.unwrap_err();
        assert_eq!(failure, SynthesisFailure::EmptyAnswer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let synthesizer =
            AnswerSynthesizer::new(Arc::new(SlowModel)).with_timeout(Duration::from_secs(5));
        let failure = synthesizer.synthesize("ctx", "q").await.unwrap_err();
        assert_eq!(failure, SynthesisFailure::Timeout { after: Duration::from_secs(5) });
    }
}
