//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docqa_rag::{ChunkingStrategy, DistanceMetric, RagConfig, Result};

/// Ask questions about a PDF or text document.
#[derive(Debug, Clone, Parser)]
#[command(name = "docqa", version, about)]
pub struct Cli {
    /// Document to load at startup (.pdf, .txt, .md).
    pub document: Option<PathBuf>,

    /// Answer these questions and exit instead of starting the console.
    #[arg(short, long = "question", value_name = "QUESTION")]
    pub questions: Vec<String>,

    /// Characters per chunk (500-2000).
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP", default_value_t = 0)]
    pub chunk_overlap: usize,

    /// How chunk boundaries are chosen.
    #[arg(long, value_enum, default_value_t = Chunking::Fixed)]
    pub chunking: Chunking,

    /// Chunks retrieved per question (1-5).
    #[arg(short = 'k', long, env = "DOCQA_TOP_K", default_value_t = 3)]
    pub top_k: usize,

    /// Distance used to rank chunks.
    #[arg(long, value_enum, default_value_t = Metric::SquaredEuclidean)]
    pub metric: Metric,

    /// Upper bound on the context sent to the model, in characters.
    #[arg(long)]
    pub max_context_chars: Option<usize>,

    /// Seconds to wait for one answer.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Embedding backend.
    #[arg(long, value_enum, env = "DOCQA_EMBEDDER", default_value_t = Embedder::Hashing)]
    pub embedder: Embedder,

    /// Completion backend.
    #[arg(long, value_enum, env = "DOCQA_BACKEND", default_value_t = Backend::Mistral)]
    pub backend: Backend,

    /// Completion model name; defaults to the backend's model.
    #[arg(long, env = "DOCQA_MODEL")]
    pub model: Option<String>,

    /// Base URL for `--backend compatible`.
    #[arg(long, env = "DOCQA_BASE_URL")]
    pub base_url: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Chunking {
    Fixed,
    Recursive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    SquaredEuclidean,
    Cosine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Embedder {
    /// Local feature hashing; no network.
    Hashing,
    /// `mistral-embed` (needs MISTRAL_API_KEY).
    Mistral,
    /// `text-embedding-3-small` (needs OPENAI_API_KEY).
    Openai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// `mistral-large-latest` (needs MISTRAL_API_KEY).
    Mistral,
    /// `gpt-4o-mini` (needs OPENAI_API_KEY).
    Openai,
    /// Any OpenAI-compatible server (needs --base-url; key from DOCQA_API_KEY).
    Compatible,
    /// Offline: repeats the question back.
    Echo,
}

impl Cli {
    /// The validated pipeline configuration these arguments describe.
    pub fn rag_config(&self) -> Result<RagConfig> {
        let mut builder = RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .chunking(match self.chunking {
                Chunking::Fixed => ChunkingStrategy::Fixed,
                Chunking::Recursive => ChunkingStrategy::Recursive,
            })
            .top_k(self.top_k)
            .metric(match self.metric {
                Metric::SquaredEuclidean => DistanceMetric::SquaredEuclidean,
                Metric::Cosine => DistanceMetric::Cosine,
            })
            .completion_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(chars) = self.max_context_chars {
            builder = builder.max_context_chars(chars);
        }
        builder.build()
    }
}
