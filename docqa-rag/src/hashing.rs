//! Local, deterministic embeddings via signed feature hashing.
//!
//! [`HashingEmbeddingProvider`] needs no model weights and no network. It maps
//! lower-cased word tokens and character trigrams into a fixed number of
//! buckets, so texts sharing vocabulary land close together. It is the default
//! provider for offline use and for tests.

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;

/// Dimensionality matching common small sentence-embedding models.
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// An [`EmbeddingProvider`] that hashes text features into a fixed-size,
/// L2-normalized vector.
///
/// Identical inputs always produce identical vectors; an input with no
/// characters produces the zero vector.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::default();
/// assert_eq!(provider.dimensions(), 384);
/// let vector = provider.vectorize("hello world");
/// assert_eq!(vector.len(), 384);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing `dimensions`-length vectors (at least one).
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    /// Compute the embedding synchronously.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.accumulate(&mut vector, 0x01, word.as_bytes(), WORD_WEIGHT);
        }

        let chars: Vec<char> = lowered.chars().collect();
        if chars.len() < 3 {
            if !chars.is_empty() {
                self.accumulate(&mut vector, 0x02, lowered.as_bytes(), TRIGRAM_WEIGHT);
            }
        } else {
            let mut buf = [0u8; 12];
            for window in chars.windows(3) {
                let mut len = 0;
                for c in window {
                    len += c.encode_utf8(&mut buf[len..]).len();
                }
                self.accumulate(&mut vector, 0x02, &buf[..len], TRIGRAM_WEIGHT);
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], kind: u8, feature: &[u8], weight: f32) {
        let hash = fnv1a(kind, feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

fn fnv1a(kind: u8, bytes: &[u8]) -> u64 {
    let mut hash = (FNV_OFFSET ^ kind as u64).wrapping_mul(FNV_PRIME);
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(provider = "hashing", batch_size = texts.len(), "embedding batch");
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}
