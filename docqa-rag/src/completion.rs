//! The text-completion backend seen by the answer synthesizer.

use async_trait::async_trait;
use thiserror::Error;

/// Why a completion call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The backend could not be reached or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The backend refused the request because of rate limiting.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend answered, but not with a usable completion.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other error status reported by the backend.
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP (or HTTP-like) status code.
        status: u16,
        /// The backend's error message.
        message: String,
    },

    /// The client was misconfigured (missing key, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// A language model that turns one prompt into one completion.
///
/// One request, one response: no streaming, no retries. Implementations
/// report failures as [`CompletionError`] rather than panicking.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::CompletionModel;
///
/// let text = model.complete("Summarize: ...").await?;
/// ```
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// The model identifier, for logs.
    fn name(&self) -> &str;

    /// Complete `prompt` and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
