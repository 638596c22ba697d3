//! Document question-answering orchestrator.
//!
//! [`DocumentQa`] coordinates the full workflow for one document at a time by
//! composing a [`Chunker`], a [`Retriever`] (embedding provider + vector
//! index) and an [`AnswerSynthesizer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::{DocumentQa, Document, HashingEmbeddingProvider, RagConfig};
//!
//! let qa = DocumentQa::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .completion_model(Arc::new(my_model))
//!     .build()?;
//!
//! qa.ingest(&Document::new(extracted_text)).await?;
//! let response = qa.ask("What is the document about?").await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::completion::CompletionModel;
use crate::config::RagConfig;
use crate::document::{Document, SearchResult, result_texts};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{DistanceMetric, VectorIndex};
use crate::retriever::Retriever;
use crate::synthesis::{AnswerSynthesizer, PromptTemplate, SynthesisFailure, assemble_context};

/// What was built when a document was ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Number of chunks in the new index.
    pub chunk_count: usize,
    /// Dimensionality of every stored vector.
    pub dimensions: usize,
    /// Distance metric used for search.
    pub metric: DistanceMetric,
    /// Name of the embedding provider that produced the vectors.
    pub embedding_provider: String,
}

/// The answer to one question together with the chunks it was based on.
#[derive(Debug, Clone, PartialEq)]
pub struct QaResponse {
    /// The synthesized answer, or why none could be produced.
    pub answer: std::result::Result<String, SynthesisFailure>,
    /// Retrieved chunk texts, most relevant first.
    pub supporting_chunks: Vec<String>,
}

impl QaResponse {
    pub fn is_answered(&self) -> bool {
        self.answer.is_ok()
    }

    /// The answer as display text; failures start with
    /// [`ERROR_MARKER`](crate::ERROR_MARKER).
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Ok(answer) => answer.clone(),
            Err(failure) => failure.to_display_string(),
        }
    }
}

/// Answers questions about the most recently ingested document.
///
/// At most one document is indexed at a time. Ingesting a document discards
/// the previous index before building the new one, so after a failed ingest
/// no index is available and questions are rejected with
/// [`RagError::NoDocument`]. Construct one via [`DocumentQa::builder()`].
pub struct DocumentQa {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    index: RwLock<Option<Arc<VectorIndex>>>,
}

impl DocumentQa {
    /// Create a new [`DocumentQaBuilder`].
    pub fn builder() -> DocumentQaBuilder {
        DocumentQaBuilder::default()
    }

    /// Return a reference to the configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The index of the current document, if one has been ingested.
    pub async fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().await.clone()
    }

    pub async fn has_document(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Drop the current document. Questions fail with
    /// [`RagError::NoDocument`] until the next successful ingest.
    pub async fn clear(&self) {
        if self.index.write().await.take().is_some() {
            info!("cleared document index");
        }
    }

    /// Ingest a document: chunk → embed → index.
    ///
    /// Replaces the previous document's index.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpus`] if the document text yields no chunks
    /// - [`RagError::ModelFailure`] / [`RagError::DimensionMismatch`] from
    ///   embedding
    pub async fn ingest(&self, document: &Document) -> Result<IndexSummary> {
        // The previous document is gone as soon as a new one arrives.
        self.clear().await;

        let source = document.source_uri.as_deref().unwrap_or("<inline>");
        let chunks = self.chunker.chunk(&document.text);
        info!(source, chunk_count = chunks.len(), "split document into chunks");

        let index = self.retriever.build(chunks).await.map_err(|e| {
            error!(source, error = %e, "failed to index document");
            e
        })?;

        let summary = IndexSummary {
            chunk_count: index.len(),
            dimensions: index.dimensions(),
            metric: index.metric(),
            embedding_provider: self.retriever.embedding_provider().name().to_string(),
        };
        *self.index.write().await = Some(Arc::new(index));

        info!(source, chunk_count = summary.chunk_count, "ingested document");
        Ok(summary)
    }

    /// Ingest already-extracted text.
    pub async fn ingest_text(&self, text: impl Into<String>) -> Result<IndexSummary> {
        self.ingest(&Document::new(text)).await
    }

    /// Retrieve the configured `top_k` chunks for `question` without
    /// synthesizing an answer.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_top_k(question, self.config.top_k).await
    }

    /// Retrieve with an explicit `top_k`, bypassing the configured value.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k` is zero.
    pub async fn retrieve_top_k(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::ConfigError("top_k must be at least 1".to_string()));
        }
        let index = self.current_index().await.ok_or(RagError::NoDocument)?;
        self.retriever.search(&index, question, top_k).await
    }

    /// Answer `question` from the current document.
    ///
    /// Retrieval errors are returned as `Err`. A failed synthesis is not an
    /// error here: it is carried in [`QaResponse::answer`] and the next
    /// question can be asked normally.
    pub async fn ask(&self, question: &str) -> Result<QaResponse> {
        self.ask_top_k(question, self.config.top_k).await
    }

    /// [`ask`](Self::ask) with an explicit `top_k`.
    pub async fn ask_top_k(&self, question: &str, top_k: usize) -> Result<QaResponse> {
        let results = self.retrieve_top_k(question, top_k).await?;
        let context = assemble_context(&results, self.config.max_context_chars);

        let answer = self.synthesizer.synthesize(&context, question).await;
        if let Err(failure) = &answer {
            warn!(error = %failure, "question could not be answered");
        }

        Ok(QaResponse { answer, supporting_chunks: result_texts(&results) })
    }
}

impl std::fmt::Debug for DocumentQa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentQa")
            .field("config", &self.config)
            .field("retriever", &self.retriever)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`DocumentQa`].
///
/// `embedding_provider` and `completion_model` are required. The chunker
/// defaults to the one described by the configuration, and the configuration
/// defaults to [`RagConfig::default()`].
///
/// # Example
///
/// ```rust,ignore
/// let qa = DocumentQa::builder()
///     .config(RagConfig::builder().chunk_size(800).top_k(5).build()?)
///     .embedding_provider(Arc::new(embedder))
///     .completion_model(Arc::new(model))
///     .build()?;
/// ```
#[derive(Default)]
pub struct DocumentQaBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    completion_model: Option<Arc<dyn CompletionModel>>,
    chunker: Option<Arc<dyn Chunker>>,
    prompt_template: Option<PromptTemplate>,
}

impl DocumentQaBuilder {
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn completion_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.completion_model = Some(model);
        self
    }

    /// Override the chunker derived from the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn prompt_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    /// Build the [`DocumentQa`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required component is missing
    /// or the configuration is invalid.
    pub fn build(self) -> Result<DocumentQa> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let completion_model = self
            .completion_model
            .ok_or_else(|| RagError::ConfigError("completion_model is required".to_string()))?;

        let chunker = self.chunker.unwrap_or_else(|| config.chunker());
        let retriever = Retriever::new(embedding_provider)
            .with_metric(config.metric)
            .with_batch_size(config.embed_batch_size);
        let synthesizer = AnswerSynthesizer::new(completion_model)
            .with_template(self.prompt_template.unwrap_or_default())
            .with_timeout(config.completion_timeout);

        Ok(DocumentQa { config, chunker, retriever, synthesizer, index: RwLock::new(None) })
    }
}
