//! Exact in-memory vector index.
//!
//! [`VectorIndex`] stores one [`IndexedChunk`] per chunk and answers top-k
//! queries by a linear scan over every stored vector. At single-document scale
//! (hundreds to a few thousand chunks) an exact scan is fast enough and keeps
//! results reproducible.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{IndexedChunk, SearchResult, TextChunk};
use crate::error::{RagError, Result};

/// How the distance between a query vector and a stored vector is measured.
///
/// Smaller distances mean greater similarity for every metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of squared component differences (L2 distance without the root).
    #[default]
    SquaredEuclidean,
    /// `1 - cosine_similarity`; zero-magnitude vectors are at distance 1.
    Cosine,
}

impl DistanceMetric {
    /// Compute the distance between two equal-length vectors.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::SquaredEuclidean => squared_euclidean(a, b),
            Self::Cosine => 1.0 - cosine_similarity(a, b),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Cosine => "cosine",
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn by_distance_then_position(a: &(f32, usize), b: &(f32, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An immutable, exact nearest-neighbor index over one document's chunks.
///
/// Built once from chunks and their embeddings; there is no insert, update,
/// or delete afterwards. Ingesting a new document builds a new index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimensions: usize,
    metric: DistanceMetric,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings, pairing them by position.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if `chunks` is empty
    /// - [`RagError::ModelFailure`] if the number of embeddings differs from
    ///   the number of chunks
    /// - [`RagError::DimensionMismatch`] if any embedding's length differs
    ///   from `dimensions`
    pub fn from_embeddings(
        chunks: Vec<TextChunk>,
        embeddings: Vec<Vec<f32>>,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus);
        }
        if embeddings.len() != chunks.len() {
            return Err(RagError::model_failure(
                "index",
                format!("expected {} embeddings, got {}", chunks.len(), embeddings.len()),
            ));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
            return Err(RagError::DimensionMismatch { expected: dimensions, actual: bad.len() });
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        Ok(Self { entries, dimensions, metric })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The indexed records, in chunk order.
    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Return the `top_k` chunks closest to `query`, most similar first.
    ///
    /// `top_k` is clamped to the number of stored chunks. Equal distances are
    /// ordered by chunk position, so repeated searches return identical lists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `query` does not have the
    /// index's dimensionality.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let k = top_k.min(self.entries.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (self.metric.distance(query, &entry.embedding), pos))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_position);

        Ok(scored
            .into_iter()
            .map(|(distance, pos)| SearchResult {
                chunk: self.entries[pos].chunk.clone(),
                distance,
            })
            .collect())
    }
}
