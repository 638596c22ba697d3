//! # docqa-rag
//!
//! Retrieval-augmented question answering over a single document.
//!
//! ## Overview
//!
//! A document's extracted text is cut into chunks, every chunk is embedded
//! into a vector, and the vectors go into an exact in-memory index. A question
//! is embedded the same way, the closest chunks are retrieved, and they are
//! handed to a language model together with the question in one prompt.
//!
//! - [`Chunker`] / [`FixedSizeChunker`] / [`RecursiveChunker`] — splitting
//! - [`EmbeddingProvider`] / [`HashingEmbeddingProvider`] /
//!   [`LazyEmbeddingProvider`] — vectors
//! - [`VectorIndex`] / [`Retriever`] — exact top-k search
//! - [`CompletionModel`] / [`AnswerSynthesizer`] — answer generation with
//!   typed [`SynthesisFailure`]s
//! - [`DocumentQa`] — the orchestrator tying them together
//!
//! ## Features
//!
//! - `mistral` — [`RemoteEmbeddingProvider::mistral`] (`mistral-embed`)
//! - `openai` — [`RemoteEmbeddingProvider::openai`] (`text-embedding-3-small`)

pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod index;
pub mod pipeline;
pub mod retriever;
pub mod synthesis;

#[cfg(any(feature = "mistral", feature = "openai"))]
pub mod remote;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, chunk_text};
pub use completion::{CompletionError, CompletionModel};
pub use config::{
    ChunkingStrategy, MAX_CHUNK_SIZE, MAX_TOP_K, MIN_CHUNK_SIZE, MIN_TOP_K, RagConfig,
    RagConfigBuilder,
};
pub use document::{Document, IndexedChunk, SearchResult, TextChunk, result_texts};
pub use embedding::{EmbeddingProvider, LazyEmbeddingProvider};
pub use error::{RagError, Result};
pub use hashing::{DEFAULT_HASHING_DIMENSIONS, HashingEmbeddingProvider};
pub use index::{DistanceMetric, VectorIndex};
pub use pipeline::{DocumentQa, DocumentQaBuilder, IndexSummary, QaResponse};
#[cfg(any(feature = "mistral", feature = "openai"))]
pub use remote::RemoteEmbeddingProvider;
#[cfg(feature = "mistral")]
pub use remote::MISTRAL_EMBED_DIMENSIONS;
#[cfg(feature = "openai")]
pub use remote::OPENAI_EMBED_DIMENSIONS;
pub use retriever::Retriever;
pub use synthesis::{
    AnswerSynthesizer, ERROR_MARKER, PromptTemplate, SynthesisFailure, assemble_context,
};
