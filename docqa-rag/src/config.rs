//! Configuration for the question-answering pipeline.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
use crate::error::{RagError, Result};
use crate::index::DistanceMetric;

/// Smallest accepted chunk size in characters.
pub const MIN_CHUNK_SIZE: usize = 500;
/// Largest accepted chunk size in characters.
pub const MAX_CHUNK_SIZE: usize = 2000;
/// Smallest accepted number of retrieved chunks.
pub const MIN_TOP_K: usize = 1;
/// Largest accepted number of retrieved chunks.
pub const MAX_TOP_K: usize = 5;

/// How document text is cut into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Fixed character windows with no regard for word boundaries.
    #[default]
    Fixed,
    /// Paragraph, then sentence, then word boundaries.
    Recursive,
}

/// Configuration parameters for the question-answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunking strategy.
    pub chunking: ChunkingStrategy,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Distance metric used by the index.
    pub metric: DistanceMetric,
    /// Maximum number of chunks sent to the embedding provider per call.
    pub embed_batch_size: usize,
    /// Upper bound on the assembled context, in characters. `None` means unbounded.
    pub max_context_chars: Option<usize>,
    /// Time allowed for one completion call.
    #[serde(with = "duration_secs")]
    pub completion_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
            chunking: ChunkingStrategy::Fixed,
            top_k: 3,
            metric: DistanceMetric::SquaredEuclidean,
            embed_batch_size: 64,
            max_context_chars: None,
            completion_timeout: Duration::from_secs(60),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Instantiate the chunker this configuration describes.
    pub fn chunker(&self) -> Arc<dyn Chunker> {
        match self.chunking {
            ChunkingStrategy::Fixed => {
                Arc::new(FixedSizeChunker::new(self.chunk_size).with_overlap(self.chunk_overlap))
            }
            ChunkingStrategy::Recursive => {
                Arc::new(RecursiveChunker::new(self.chunk_size, self.chunk_overlap))
            }
        }
    }

    /// Check every invariant the builder enforces.
    ///
    /// Useful for configurations that were deserialized rather than built.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(RagError::ConfigError(format!(
                "chunk_size ({}) must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}",
                self.chunk_size
            )));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.top_k) {
            return Err(RagError::ConfigError(format!(
                "top_k ({}) must be between {MIN_TOP_K} and {MAX_TOP_K}",
                self.top_k
            )));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_context_chars == Some(0) {
            return Err(RagError::ConfigError(
                "max_context_chars must be greater than zero when set".to_string(),
            ));
        }
        if self.completion_timeout.is_zero() {
            return Err(RagError::ConfigError(
                "completion_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Bound the assembled context to `chars` characters.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = Some(chars);
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size` is outside `500..=2000`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k` is outside `1..=5`
    /// - `embed_batch_size == 0`, `max_context_chars == Some(0)`, or the
    ///   completion timeout is zero
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 0);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.metric, DistanceMetric::SquaredEuclidean);
    }

    #[test]
    fn test_chunk_size_range() {
        assert!(RagConfig::builder().chunk_size(499).build().is_err());
        assert!(RagConfig::builder().chunk_size(500).build().is_ok());
        assert!(RagConfig::builder().chunk_size(2000).build().is_ok());
        assert!(RagConfig::builder().chunk_size(2001).build().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let err = RagConfig::builder().chunk_size(500).chunk_overlap(500).build().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
        assert!(RagConfig::builder().chunk_size(500).chunk_overlap(100).build().is_ok());
    }

    #[test]
    fn test_top_k_range() {
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().top_k(5).build().is_ok());
        assert!(RagConfig::builder().top_k(6).build().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(RagConfig::builder().embed_batch_size(0).build().is_err());
        assert!(RagConfig::builder().max_context_chars(0).build().is_err());
        assert!(RagConfig::builder().completion_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_timeout() {
        let config = RagConfig::builder()
            .completion_timeout(Duration::from_millis(1500))
            .chunking(ChunkingStrategy::Recursive)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"completion_timeout\":1.5"));
        assert!(json.contains("\"chunking\":\"recursive\""));
        let back: RagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
