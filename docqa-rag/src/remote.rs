//! HTTP embedding providers for OpenAI-style `/v1/embeddings` endpoints.
//!
//! This module is only available when the `mistral` or `openai` feature is
//! enabled. Both vendors accept the same request shape, so one client covers
//! them and any compatible server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

#[cfg(feature = "mistral")]
const MISTRAL_EMBEDDINGS_URL: &str = "https://api.mistral.ai/v1/embeddings";
#[cfg(feature = "mistral")]
const MISTRAL_MODEL: &str = "mistral-embed";
/// Width of `mistral-embed` vectors.
#[cfg(feature = "mistral")]
pub const MISTRAL_EMBED_DIMENSIONS: usize = 1024;

#[cfg(feature = "openai")]
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
#[cfg(feature = "openai")]
const OPENAI_MODEL: &str = "text-embedding-3-small";
/// Width of `text-embedding-3-small` vectors.
#[cfg(feature = "openai")]
pub const OPENAI_EMBED_DIMENSIONS: usize = 1536;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] that calls a remote embeddings API.
///
/// # Configuration
///
/// - `model` – vendor default unless overridden with [`with_model`](Self::with_model).
/// - `dimensions` – vendor default; [`with_dimensions`](Self::with_dimensions)
///   also asks the API to truncate (OpenAI `text-embedding-3-*` only).
/// - `api_key` – from the constructor or the vendor's environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RemoteEmbeddingProvider;
///
/// let provider = RemoteEmbeddingProvider::mistral_from_env()?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl RemoteEmbeddingProvider {
    /// Create a provider for any server speaking the OpenAI embeddings protocol.
    pub fn compatible(
        provider: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let provider = provider.into();
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::model_failure(provider, "API key must not be empty"));
        }

        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build().map_err(|e| {
            RagError::model_failure(&provider, format!("failed to build client: {e}"))
        })?;

        Ok(Self {
            client,
            provider,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            dimensions,
            request_dimensions: None,
        })
    }

    /// Mistral's `mistral-embed` model (1024 dimensions).
    #[cfg(feature = "mistral")]
    pub fn mistral(api_key: impl Into<String>) -> Result<Self> {
        Self::compatible(
            "Mistral",
            api_key,
            MISTRAL_EMBEDDINGS_URL,
            MISTRAL_MODEL,
            MISTRAL_EMBED_DIMENSIONS,
        )
    }

    /// [`mistral`](Self::mistral) with the key from `MISTRAL_API_KEY`.
    #[cfg(feature = "mistral")]
    pub fn mistral_from_env() -> Result<Self> {
        let api_key = std::env::var("MISTRAL_API_KEY").map_err(|_| {
            RagError::model_failure("Mistral", "MISTRAL_API_KEY environment variable not set")
        })?;
        Self::mistral(api_key)
    }

    /// OpenAI's `text-embedding-3-small` model (1536 dimensions).
    #[cfg(feature = "openai")]
    pub fn openai(api_key: impl Into<String>) -> Result<Self> {
        Self::compatible(
            "OpenAI",
            api_key,
            OPENAI_EMBEDDINGS_URL,
            OPENAI_MODEL,
            OPENAI_EMBED_DIMENSIONS,
        )
    }

    /// [`openai`](Self::openai) with the key from `OPENAI_API_KEY`.
    #[cfg(feature = "openai")]
    pub fn openai_from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::model_failure("OpenAI", "OPENAI_API_KEY environment variable not set")
        })?;
        Self::openai(api_key)
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    ///
    /// When set, the API returns embeddings truncated to this size.
    /// This also updates the value returned by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    fn failure(&self, message: impl Into<String>) -> RagError {
        RagError::model_failure(&self.provider, message)
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = %self.provider, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| self.failure("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = %self.provider,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %self.provider, error = %e, "request failed");
                self.failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = %self.provider, %status, "API error");
            return Err(self.failure(format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = %self.provider, error = %e, "failed to parse response");
            self.failure(format!("failed to parse response: {e}"))
        })?;

        let mut data = embedding_response.data;
        if data.len() != texts.len() {
            return Err(self.failure(format!(
                "requested {} embeddings, API returned {}",
                texts.len(),
                data.len()
            )));
        }
        // Rows may come back out of order; `index` refers to the input position.
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.provider
    }
}
