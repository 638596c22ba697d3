//! Semantic retrieval over a single document.
//!
//! The [`Retriever`] pairs an [`EmbeddingProvider`] with the exact
//! [`VectorIndex`]: it embeds chunks to build an index and embeds questions to
//! search it. Both sides must go through the same provider so that every
//! vector shares one dimensionality.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::document::{SearchResult, TextChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{DistanceMetric, VectorIndex};

/// Embeds chunks into a [`VectorIndex`] and answers top-k queries against it.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docqa_rag::{HashingEmbeddingProvider, Retriever, chunk_text, TextChunk};
///
/// let retriever = Retriever::new(Arc::new(HashingEmbeddingProvider::default()));
/// let index = retriever.build_from_texts(chunk_text("AAAA", 2)).await?;
/// let results = retriever.search(&index, "AA", 1).await?;
/// assert_eq!(results[0].chunk.text, "AA");
/// ```
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    metric: DistanceMetric,
    batch_size: usize,
}

impl Retriever {
    /// Create a retriever using squared Euclidean distance and batches of 64.
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedding_provider, metric: DistanceMetric::default(), batch_size: 64 }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set how many chunks are sent to the provider per call (at least one).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embed every chunk and build an index over them.
    ///
    /// Either the whole index is returned or an error is; a failure part-way
    /// through embedding never leaves a partial index behind.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if `chunks` is empty (nothing is embedded)
    /// - [`RagError::ModelFailure`] if the embedding provider fails
    /// - [`RagError::DimensionMismatch`] if the provider returns vectors of
    ///   the wrong length
    pub async fn build(&self, chunks: Vec<TextChunk>) -> Result<VectorIndex> {
        if chunks.is_empty() {
            error!("refusing to build an index from zero chunks");
            return Err(RagError::EmptyCorpus);
        }

        let dimensions = self.embedding_provider.dimensions();
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            debug!(
                provider = self.embedding_provider.name(),
                batch_size = texts.len(),
                "embedding chunk batch"
            );
            let vectors = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(
                    provider = self.embedding_provider.name(),
                    error = %e,
                    "embedding failed during build"
                );
                e
            })?;
            embeddings.extend(vectors);
        }

        let index = VectorIndex::from_embeddings(chunks, embeddings, dimensions, self.metric)?;
        info!(chunk_count = index.len(), dimensions, metric = %self.metric, "built vector index");
        Ok(index)
    }

    /// Convenience for [`build`](Self::build) over plain strings, numbered in order.
    pub async fn build_from_texts<I, S>(&self, texts: I) -> Result<VectorIndex>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks =
            texts.into_iter().enumerate().map(|(i, text)| TextChunk::new(i, text)).collect();
        self.build(chunks).await
    }

    /// Embed `query` and return the `top_k` closest chunks, most similar first.
    ///
    /// # Errors
    ///
    /// - [`RagError::ModelFailure`] if the query cannot be embedded
    /// - [`RagError::DimensionMismatch`] if the query vector does not match
    ///   the index
    pub async fn search(
        &self,
        index: &VectorIndex,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results = index.search(&query_embedding, top_k).map_err(|e| {
            error!(error = %e, "vector index search failed");
            e
        })?;

        info!(result_count = results.len(), top_k, "query completed");
        Ok(results)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedding_provider", &self.embedding_provider.name())
            .field("metric", &self.metric)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::chunking::chunk_text;
    use crate::hashing::HashingEmbeddingProvider;

    /// Records batch sizes and returns vectors of a configurable length.
    struct CountingProvider {
        calls: AtomicUsize,
        dimensions: usize,
        returned_len: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; self.returned_len])
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![0.0; self.returned_len]).collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RagError::model_failure("failing", "model weights unavailable"))
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn test_two_char_chunks_end_to_end() {
        let retriever = Retriever::new(Arc::new(HashingEmbeddingProvider::default()));
        let chunks = chunk_text("AAAA", 2);
        assert_eq!(chunks, vec!["AA", "AA"]);

        let index = retriever.build_from_texts(chunks).await.unwrap();
        assert_eq!(index.len(), 2);

        let results = retriever.search(&index, "AA", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "AA");
        assert_eq!(results[0].chunk.index, 0);
    }

    #[tokio::test]
    async fn test_empty_chunks_is_empty_corpus() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 4,
            returned_len: 4,
        });
        let retriever = Retriever::new(provider.clone());
        let err = retriever.build_from_texts(chunk_text("", 500)).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyCorpus));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batches_respect_batch_size() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 4,
            returned_len: 4,
        });
        let retriever = Retriever::new(provider.clone()).with_batch_size(3);
        let index = retriever.build_from_texts(chunk_text("abcdefghij", 1)).await.unwrap();
        assert_eq!(index.len(), 10);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_provider_returning_wrong_length_is_dimension_mismatch() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            dimensions: 4,
            returned_len: 3,
        });
        let retriever = Retriever::new(provider);
        let err = retriever.build_from_texts(["x", "y"]).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 4, actual: 3 }));
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let builder = Retriever::new(Arc::new(HashingEmbeddingProvider::new(8)));
        let index = builder.build_from_texts(["alpha", "beta"]).await.unwrap();

        let other = Retriever::new(Arc::new(HashingEmbeddingProvider::new(16)));
        let err = other.search(&index, "alpha", 1).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 8, actual: 16 }));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let retriever = Retriever::new(Arc::new(FailingProvider));
        let err = retriever.build_from_texts(["x"]).await.unwrap_err();
        assert!(matches!(err, RagError::ModelFailure { .. }));
    }
}
