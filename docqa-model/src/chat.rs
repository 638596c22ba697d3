//! Chat-completions client over reqwest.

use async_trait::async_trait;
use docqa_rag::{CompletionError, CompletionModel};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ChatConfig;

/// A [`CompletionModel`] backed by an OpenAI-style `/chat/completions` API.
///
/// Mistral, OpenAI and most self-hosted servers accept the same request, so
/// one client covers them. The prompt is sent as a single user message and the
/// first choice's content is returned unmodified.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::{ChatCompletionsModel, ChatConfig};
///
/// let model = ChatCompletionsModel::new(ChatConfig::mistral_from_env()?)?;
/// let answer = model.complete("Say hello").await?;
/// ```
pub struct ChatCompletionsModel {
    client: reqwest::Client,
    config: ChatConfig,
    endpoint: String,
}

impl ChatCompletionsModel {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Configuration`] if the API key is empty or
    /// the HTTP client cannot be built.
    pub fn new(config: ChatConfig) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::Configuration(format!(
                "{}: API key must not be empty",
                config.provider
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CompletionError::Configuration(format!("failed to build client: {e}")))?;

        Ok(Self { client, endpoint: config.endpoint(), config })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        Self::new(ChatConfig::compatible(api_key, base_url, model))
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

impl std::fmt::Debug for ChatCompletionsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsModel").field("config", &self.config).finish()
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map an unsuccessful HTTP status and its body to a [`CompletionError`].
fn classify_status(status: StatusCode, body: String) -> CompletionError {
    // Mistral sometimes answers with `{"message": ...}` instead of `{"error": {...}}`.
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .or_else(|_| {
            serde_json::from_str::<serde_json::Value>(&body).map_err(|_| ()).and_then(|v| {
                v.get("message").and_then(|m| m.as_str()).map(str::to_string).ok_or(())
            })
        })
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CompletionError::Authentication(message)
        }
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(message),
        _ => CompletionError::Backend { status: status.as_u16(), message },
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionsModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            prompt_len = prompt.len(),
            "sending chat completion request"
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %self.config.provider, error = %e, "request failed");
                CompletionError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = %self.config.provider, %status, "API error");
            return Err(classify_status(status, body));
        }

        let body = response.text().await.map_err(|e| CompletionError::Network(e.to_string()))?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            error!(provider = %self.config.provider, error = %e, "failed to parse response");
            CompletionError::MalformedResponse(format!("invalid JSON: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::MalformedResponse("response has no content".into()))
    }
}
