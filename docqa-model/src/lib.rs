//! # docqa-model
//!
//! Completion backends for the docqa answer synthesizer.
//!
//! ## Overview
//!
//! - [`ChatCompletionsModel`] - Mistral, OpenAI or any OpenAI-compatible
//!   `/chat/completions` server
//! - [`MockCompletionModel`] - scripted replies for tests
//! - [`EchoCompletionModel`] - deterministic offline answers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{ChatCompletionsModel, ChatConfig};
//!
//! // Reads MISTRAL_API_KEY; the model defaults to mistral-large-latest.
//! let model = ChatCompletionsModel::new(ChatConfig::mistral_from_env()?)?;
//! ```
//!
//! ## Features
//!
//! - `mistral` (default) - [`ChatConfig::mistral`]
//! - `openai` - [`ChatConfig::openai`]

pub mod chat;
pub mod config;
pub mod mock;

pub use chat::ChatCompletionsModel;
pub use config::{
    ChatConfig, MISTRAL_API_BASE, MISTRAL_DEFAULT_MODEL, OPENAI_API_BASE, OPENAI_DEFAULT_MODEL,
};
pub use mock::{EchoCompletionModel, MockCompletionModel};
