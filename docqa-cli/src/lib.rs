//! # docqa-cli
//!
//! The `docqa` console: load a PDF or text file, then ask questions about it.
//!
//! ```text
//! $ docqa manual.pdf --top-k 5
//! Extracting text from manual.pdf...
//! Splitting into chunks and building the index...
//! Ready: 42 chunks indexed.
//! docqa> How long is the warranty?
//! ```

pub mod args;
pub mod backends;
pub mod console;
pub mod extract;

use std::io::Write;

use anyhow::{Context, bail};
use docqa_rag::DocumentQa;
use tracing::info;

pub use args::Cli;
pub use console::{Command, Session, parse_command};

/// Build the pipeline the arguments describe.
pub fn build_session(cli: &Cli) -> anyhow::Result<Session> {
    let config = cli.rag_config().context("invalid configuration")?;
    let qa = DocumentQa::builder()
        .config(config)
        .embedding_provider(backends::build_embedder(cli.embedder))
        .completion_model(backends::build_model(cli)?)
        .build()?;
    info!(config = ?qa.config(), "pipeline ready");
    Ok(Session::new(qa))
}

/// Run the console, or answer `--question`s and exit.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut session = build_session(&cli)?;
    let mut stdout = std::io::stdout();

    if cli.questions.is_empty() {
        if let Some(path) = &cli.document {
            session.handle(Command::Load(path.clone()), &mut stdout).await?;
        }
        return console::run_console(session).await;
    }

    let Some(path) = &cli.document else {
        bail!("--question needs a document to ask about");
    };
    session.load(path, &mut stdout).await?;
    for question in &cli.questions {
        writeln!(stdout, "\nQuestion: {question}")?;
        session.ask(question, &mut stdout).await?;
    }
    stdout.flush()?;
    Ok(())
}
