//! Embedding and completion backends selected on the command line.

use std::sync::Arc;

use anyhow::{Context, bail};
use docqa_model::{ChatCompletionsModel, ChatConfig, EchoCompletionModel};
use docqa_rag::{
    CompletionModel, EmbeddingProvider, HashingEmbeddingProvider, LazyEmbeddingProvider,
    MISTRAL_EMBED_DIMENSIONS, OPENAI_EMBED_DIMENSIONS, RagError, RemoteEmbeddingProvider,
};

use crate::args::{Backend, Cli, Embedder};

/// Build the embedding provider.
///
/// Remote providers are wrapped in a [`LazyEmbeddingProvider`], so a missing
/// API key surfaces on first use rather than at startup.
pub fn build_embedder(kind: Embedder) -> Arc<dyn EmbeddingProvider> {
    match kind {
        Embedder::Hashing => Arc::new(HashingEmbeddingProvider::default()),
        Embedder::Mistral => Arc::new(LazyEmbeddingProvider::new(
            "mistral-embed",
            MISTRAL_EMBED_DIMENSIONS,
            || async {
                let provider = RemoteEmbeddingProvider::mistral_from_env()?;
                Ok::<_, RagError>(Arc::new(provider) as Arc<dyn EmbeddingProvider>)
            },
        )),
        Embedder::Openai => Arc::new(LazyEmbeddingProvider::new(
            "text-embedding-3-small",
            OPENAI_EMBED_DIMENSIONS,
            || async {
                let provider = RemoteEmbeddingProvider::openai_from_env()?;
                Ok::<_, RagError>(Arc::new(provider) as Arc<dyn EmbeddingProvider>)
            },
        )),
    }
}

/// Build the completion model.
pub fn build_model(cli: &Cli) -> anyhow::Result<Arc<dyn CompletionModel>> {
    let config = match cli.backend {
        Backend::Echo => return Ok(Arc::new(EchoCompletionModel)),
        Backend::Mistral => ChatConfig::mistral_from_env().context("Mistral backend")?,
        Backend::Openai => ChatConfig::openai_from_env().context("OpenAI backend")?,
        Backend::Compatible => {
            let Some(base_url) = &cli.base_url else {
                bail!("--backend compatible needs --base-url (or DOCQA_BASE_URL)");
            };
            let Some(model) = &cli.model else {
                bail!("--backend compatible needs --model (or DOCQA_MODEL)");
            };
            // Local servers often ignore the key but the header must not be empty.
            let api_key = std::env::var("DOCQA_API_KEY").unwrap_or_else(|_| "none".to_string());
            ChatConfig::compatible(api_key, base_url.as_str(), model.as_str())
        }
    };

    let config = match &cli.model {
        Some(model) => config.with_model(model.as_str()),
        None => config,
    };
    Ok(Arc::new(ChatCompletionsModel::new(config)?))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_hashing_is_local() {
        let embedder = build_embedder(Embedder::Hashing);
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 384);
    }

    #[test]
    fn test_remote_embedders_are_lazy() {
        let embedder = build_embedder(Embedder::Mistral);
        assert_eq!(embedder.dimensions(), 1024);
        assert_eq!(embedder.name(), "mistral-embed");
    }

    #[test]
    fn test_echo_backend_needs_no_credentials() {
        let cli = Cli::try_parse_from(["docqa", "--backend", "echo"]).unwrap();
        assert_eq!(build_model(&cli).unwrap().name(), "echo");
    }

    #[test]
    fn test_compatible_backend_requires_base_url() {
        let cli = Cli::try_parse_from(["docqa", "--backend", "compatible", "--model", "llama3"])
            .unwrap();
        if cli.base_url.is_none() {
            assert!(build_model(&cli).is_err());
        }
    }

    #[test]
    fn test_compatible_backend_uses_model_flag() {
        let cli = Cli::try_parse_from([
            "docqa",
            "--backend",
            "compatible",
            "--base-url",
            "http://localhost:11434/v1",
            "--model",
            "llama3",
        ])
        .unwrap();
        assert_eq!(build_model(&cli).unwrap().name(), "llama3");
    }
}
