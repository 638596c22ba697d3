//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// The extracted text of one uploaded document.
///
/// A session holds at most one document; ingesting another replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// The full extracted text, pages concatenated in order.
    pub text: String,
    /// Optional URI or path pointing to the original upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document from already-extracted text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), source_uri: None }
    }

    /// Attach the location the document was loaded from.
    pub fn with_source(mut self, source_uri: impl Into<String>) -> Self {
        self.source_uri = Some(source_uri.into());
        self
    }
}

/// A contiguous slice of document text, the atomic retrievable unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TextChunk {
    /// Position of this chunk in the document's chunk sequence.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
}

impl TextChunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }
}

/// A [`TextChunk`] stored together with its embedding vector.
///
/// Keeping both in one record means the vector at a given index position can
/// never drift out of step with its text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedChunk {
    /// The chunk this vector was computed from.
    pub chunk: TextChunk,
    /// The vector embedding for the chunk's text.
    pub embedding: Vec<f32>,
}

/// A retrieved [`TextChunk`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: TextChunk,
    /// Distance to the query vector (lower is more similar).
    pub distance: f32,
}

/// Collect the chunk texts of ranked search results, preserving rank order.
pub fn result_texts(results: &[SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.chunk.text.clone()).collect()
}
