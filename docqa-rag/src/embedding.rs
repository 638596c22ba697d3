//! Embedding provider trait for generating vector embeddings from text.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Every vector a provider returns has exactly [`dimensions`](Self::dimensions)
/// components, and the same provider must be used to build an index and to
/// query it. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let provider = HashingEmbeddingProvider::default();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input, such as a query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, one row per input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name for logs and error messages.
    fn name(&self) -> &str {
        "embedding"
    }
}

type ProviderFactory =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn EmbeddingProvider>>> + Send + Sync>;

/// An [`EmbeddingProvider`] that constructs its underlying model on first use.
///
/// Loading an embedding model is expensive, so the factory runs at most once
/// successfully; every later call reuses the same instance. Concurrent first
/// calls wait on the same initialization. If the factory fails, the error is
/// returned as [`RagError::ModelFailure`] and the next call tries again.
///
/// The declared `dimensions` are checked against the loaded provider, so an
/// index can be sized before the model exists.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use docqa_rag::{EmbeddingProvider, HashingEmbeddingProvider, LazyEmbeddingProvider};
///
/// let lazy = LazyEmbeddingProvider::new("hashing", 384, || async {
///     Ok::<_, docqa_rag::RagError>(
///         Arc::new(HashingEmbeddingProvider::new(384)) as Arc<dyn EmbeddingProvider>
///     )
/// });
/// assert!(!lazy.is_initialized());
/// assert_eq!(lazy.dimensions(), 384);
/// ```
pub struct LazyEmbeddingProvider {
    name: String,
    dimensions: usize,
    factory: ProviderFactory,
    cell: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl LazyEmbeddingProvider {
    /// Create a lazy provider that will call `factory` on first use.
    pub fn new<F, Fut>(name: impl Into<String>, dimensions: usize, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Arc<dyn EmbeddingProvider>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            dimensions,
            factory: Box::new(move || Box::pin(factory())),
            cell: OnceCell::new(),
        }
    }

    /// Whether the underlying provider has been constructed yet.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn provider(&self) -> Result<&Arc<dyn EmbeddingProvider>> {
        self.cell
            .get_or_try_init(|| async {
                info!(provider = %self.name, "loading embedding model");
                let provider = (self.factory)().await.map_err(|e| {
                    error!(provider = %self.name, error = %e, "embedding model failed to load");
                    match e {
                        RagError::ModelFailure { .. } => e,
                        other => RagError::model_failure(&self.name, other.to_string()),
                    }
                })?;
                if provider.dimensions() != self.dimensions {
                    return Err(RagError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: provider.dimensions(),
                    });
                }
                Ok(provider)
            })
            .await
    }
}

impl fmt::Debug for LazyEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyEmbeddingProvider")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for LazyEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider().await?.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.provider().await?.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}
