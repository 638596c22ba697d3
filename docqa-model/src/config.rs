//! Connection settings for chat-completion backends.

use std::time::Duration;

use docqa_rag::CompletionError;

/// Mistral API base URL.
pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";
/// Model used when none is configured for Mistral.
pub const MISTRAL_DEFAULT_MODEL: &str = "mistral-large-latest";

/// OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
/// Model used when none is configured for OpenAI.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a [`ChatCompletionsModel`](crate::ChatCompletionsModel).
///
/// # Example
///
/// ```rust
/// use docqa_model::ChatConfig;
///
/// let config = ChatConfig::compatible("key", "http://localhost:11434/v1", "llama3")
///     .with_temperature(0.0)
///     .with_max_tokens(512);
/// assert_eq!(config.endpoint(), "http://localhost:11434/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct ChatConfig {
    /// Label used in logs and error messages.
    pub provider: String,
    pub api_key: String,
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Transport-level timeout for one request.
    pub request_timeout: Duration,
}

impl ChatConfig {
    /// Any server speaking the OpenAI chat-completions protocol.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: "openai-compatible".to_string(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Mistral with `mistral-large-latest`.
    #[cfg(feature = "mistral")]
    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self::compatible(api_key, MISTRAL_API_BASE, MISTRAL_DEFAULT_MODEL).with_provider("mistral")
    }

    /// [`mistral`](Self::mistral) with the key read from `MISTRAL_API_KEY`.
    #[cfg(feature = "mistral")]
    pub fn mistral_from_env() -> Result<Self, CompletionError> {
        Ok(Self::mistral(env_key("MISTRAL_API_KEY")?))
    }

    /// OpenAI with `gpt-4o-mini`.
    #[cfg(feature = "openai")]
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::compatible(api_key, OPENAI_API_BASE, OPENAI_DEFAULT_MODEL).with_provider("openai")
    }

    /// [`openai`](Self::openai) with the key read from `OPENAI_API_KEY`.
    #[cfg(feature = "openai")]
    pub fn openai_from_env() -> Result<Self, CompletionError> {
        Ok(Self::openai(env_key("OPENAI_API_KEY")?))
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The full chat-completions URL.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(any(feature = "mistral", feature = "openai"))]
fn env_key(var: &str) -> Result<String, CompletionError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(CompletionError::Configuration(format!("{var} environment variable not set"))),
    }
}
