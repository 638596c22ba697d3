//! Interactive console and the output it prints.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use docqa_rag::{DocumentQa, IndexSummary, QaResponse, RagConfig};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use crate::extract::load_document;

const PROMPT: &str = "docqa> ";

const HELP: &str = "\
Type a question to ask about the loaded document.

Commands:
  :load <path>   load a PDF or text file, replacing the current document
  :config        show the current configuration
  :help          show this message
  :quit          exit (also Ctrl-D)";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Load(PathBuf),
    Config,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse a console line. Anything not starting with `:` is a question.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Command::Ask(line.to_string());
    };

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    let rest = rest.trim();
    match name {
        "load" | "l" if !rest.is_empty() => Command::Load(PathBuf::from(rest)),
        "config" | "c" => Command::Config,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// The configuration summary shown after indexing.
pub fn render_config(config: &RagConfig, embedding_model: &str) -> String {
    let summary = serde_json::json!({
        "chunk_size": config.chunk_size,
        "chunk_overlap": config.chunk_overlap,
        "top_k": config.top_k,
        "embedding_model": embedding_model,
        "retrieval": format!("exact ({})", config.metric),
    });
    serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string())
}

/// The answer followed by its numbered supporting excerpts.
pub fn render_response(response: &QaResponse) -> String {
    let mut out = format!("Answer:\n{}\n", response.answer_text());
    if !response.supporting_chunks.is_empty() {
        out.push_str("\nSupporting excerpts:\n");
        for (i, chunk) in response.supporting_chunks.iter().enumerate() {
            out.push_str(&format!("\n--- Excerpt {} ---\n{}\n", i + 1, chunk.trim_end()));
        }
    }
    out
}

/// A document Q&A session driven by console commands.
pub struct Session {
    qa: DocumentQa,
    document: Option<PathBuf>,
}

impl Session {
    pub fn new(qa: DocumentQa) -> Self {
        Self { qa, document: None }
    }

    /// The document currently indexed, if any.
    pub fn document(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    /// Extract, chunk and index `path`, reporting each step to `out`.
    ///
    /// The previous document is dropped even when loading fails.
    pub async fn load(
        &mut self,
        path: &Path,
        out: &mut impl Write,
    ) -> anyhow::Result<IndexSummary> {
        self.document = None;
        self.qa.clear().await;
        writeln!(out, "Extracting text from {}...", path.display())?;
        let document = load_document(path).await?;

        writeln!(out, "Splitting into chunks and building the index...")?;
        let summary = self
            .qa
            .ingest(&document)
            .await
            .with_context(|| format!("failed to index {}", path.display()))?;

        self.document = Some(path.to_path_buf());
        writeln!(out, "Ready: {} chunks indexed.", summary.chunk_count)?;
        writeln!(out, "{}", render_config(self.qa.config(), &summary.embedding_provider))?;
        Ok(summary)
    }

    /// Answer `question` and print the answer with its excerpts.
    ///
    /// Retrieval errors are returned; a failed answer is printed like any
    /// other answer.
    pub async fn ask(&self, question: &str, out: &mut impl Write) -> anyhow::Result<QaResponse> {
        let response = self.qa.ask(question).await?;
        write!(out, "{}", render_response(&response))?;
        Ok(response)
    }

    /// Run one command. Returns `false` when the console should exit.
    pub async fn handle(
        &mut self,
        command: Command,
        out: &mut impl Write,
    ) -> anyhow::Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Empty => {}
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Unknown(line) => writeln!(out, "Unknown command: {line} (try :help)")?,
            Command::Config => {
                let embedder = self.qa.retriever().embedding_provider().name().to_string();
                writeln!(out, "{}", render_config(self.qa.config(), &embedder))?;
            }
            Command::Load(path) => {
                if let Err(e) = self.load(&path, out).await {
                    error!(path = %path.display(), error = %e, "document load failed");
                    writeln!(out, "Something went wrong: {e:#}")?;
                }
            }
            Command::Ask(question) => {
                if let Err(e) = self.ask(&question, out).await {
                    report_query_error(&e, out)?;
                }
            }
        }
        Ok(true)
    }
}

fn report_query_error(e: &anyhow::Error, out: &mut impl Write) -> std::io::Result<()> {
    match e.downcast_ref::<docqa_rag::RagError>() {
        Some(rag) if !rag.is_fatal() => {
            writeln!(out, "No document loaded yet. Use :load <path> first.")
        }
        _ => {
            error!(error = %e, "question failed");
            writeln!(out, "Something went wrong: {e:#}")
        }
    }
}

/// Read commands until `:quit` or end of input.
pub async fn run_console(mut session: Session) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    let mut stdout = std::io::stdout();

    println!("Ask questions about your document. Type :help for commands.");
    if session.document().is_none() {
        println!("Start with :load <path>.");
    }

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        let _ = editor.add_history_entry(line.as_str());

        if !session.handle(parse_command(&line), &mut stdout).await? {
            break;
        }
        stdout.flush()?;
    }

    info!("console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use docqa_rag::{CompletionError, SynthesisFailure};

    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  what is this?  "), Command::Ask("what is this?".into()));
        assert_eq!(parse_command(":load docs/a b.pdf"), Command::Load("docs/a b.pdf".into()));
        assert_eq!(parse_command(":q"), Command::Quit);
        assert_eq!(parse_command(":config"), Command::Config);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command(":load"), Command::Unknown(":load".into()));
        assert_eq!(parse_command(":frobnicate"), Command::Unknown(":frobnicate".into()));
    }

    #[test]
    fn test_render_response_numbers_excerpts() {
        let response = QaResponse {
            answer: Ok("Three years.".into()),
            supporting_chunks: vec!["first chunk\n".into(), "second chunk".into()],
        };
        let rendered = render_response(&response);
        assert!(rendered.starts_with("Answer:\nThree years.\n"));
        assert!(rendered.contains("--- Excerpt 1 ---\nfirst chunk\n"));
        assert!(rendered.contains("--- Excerpt 2 ---\nsecond chunk\n"));
    }

    #[test]
    fn test_render_failed_response() {
        let response = QaResponse {
            answer: Err(SynthesisFailure::Backend(CompletionError::Network("down".into()))),
            supporting_chunks: vec![],
        };
        let rendered = render_response(&response);
        assert!(rendered.contains("Error during answering: "));
        assert!(!rendered.contains("Excerpt"));
    }

    #[test]
    fn test_render_config() {
        let rendered = render_config(&RagConfig::default(), "hashing");
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["chunk_size"], 1000);
        assert_eq!(value["top_k"], 3);
        assert_eq!(value["embedding_model"], "hashing");
        assert_eq!(value["retrieval"], "exact (squared_euclidean)");
    }
}
