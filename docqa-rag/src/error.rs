//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting a document or retrieving from it.
///
/// Answer synthesis failures are not part of this enum; they are reported
/// per question as [`SynthesisFailure`](crate::SynthesisFailure) so that a
/// failed answer never tears down the session.
#[derive(Debug, Error)]
pub enum RagError {
    /// An index was requested over zero chunks.
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    /// The embedding backend failed to load or to encode.
    #[error("Model failure ({provider}): {message}")]
    ModelFailure {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's length disagrees with the dimensionality of the index or
    /// provider it is used with.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index or provider declares.
        expected: usize,
        /// The dimensionality that was actually observed.
        actual: usize,
    },

    /// A question was asked while no document is indexed.
    #[error("no document has been indexed")]
    NoDocument,

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The uploaded document could not be converted to text.
    #[error("Extraction error: {0}")]
    ExtractionError(String),
}

impl RagError {
    /// Shorthand for a [`RagError::ModelFailure`].
    pub fn model_failure(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelFailure { provider: provider.into(), message: message.into() }
    }

    /// Whether this error stops the current document's pipeline for good.
    ///
    /// Every variant except [`RagError::NoDocument`] does; asking again after
    /// a successful ingest is the only recovery from that one.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoDocument)
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
