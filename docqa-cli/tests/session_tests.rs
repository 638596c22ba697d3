//! Console session driven end to end with the offline backends.

use std::path::PathBuf;

use clap::Parser;
use docqa_cli::{Cli, Command, build_session, parse_command};

const MANUAL: &str = "The dishwasher must be descaled every three months. \
Use only the supplied descaling powder. ";

fn write_document(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("docqa-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).expect("write test document");
    path
}

fn offline_cli() -> Cli {
    let args = ["docqa", "--backend", "echo", "--embedder", "hashing", "--chunk-size", "500"];
    Cli::try_parse_from(args).unwrap()
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn load_then_ask_prints_answer_and_excerpts() {
    let path = write_document("manual.txt", &MANUAL.repeat(20));
    let mut session = build_session(&offline_cli()).unwrap();

    let mut out = Vec::new();
    assert!(session.handle(Command::Load(path.clone()), &mut out).await.unwrap());
    let printed = output(out);
    assert!(printed.contains("Extracting text from"));
    assert!(printed.contains("Splitting into chunks and building the index..."));
    assert!(printed.contains("Ready: 4 chunks indexed."));
    assert!(printed.contains("\"chunk_size\": 500"));
    assert_eq!(session.document(), Some(path.as_path()));

    let mut out = Vec::new();
    let keep_going =
        session.handle(parse_command("How often is descaling needed?"), &mut out).await.unwrap();
    assert!(keep_going);
    let printed = output(out);
    assert!(printed.starts_with("Answer:\nEcho: How often is descaling needed?\n"));
    assert!(printed.contains("--- Excerpt 1 ---"));
    assert!(printed.contains("--- Excerpt 3 ---"));
    assert!(!printed.contains("--- Excerpt 4 ---"));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn question_without_document_keeps_console_running() {
    let mut session = build_session(&offline_cli()).unwrap();
    let mut out = Vec::new();
    assert!(session.handle(parse_command("anything?"), &mut out).await.unwrap());
    assert!(output(out).contains("No document loaded yet"));
}

#[tokio::test]
async fn empty_document_reports_error_and_continues() {
    let path = write_document("empty.txt", "");
    let mut session = build_session(&offline_cli()).unwrap();

    let mut out = Vec::new();
    assert!(session.handle(Command::Load(path.clone()), &mut out).await.unwrap());
    assert!(output(out).contains("Something went wrong"));
    assert!(session.document().is_none());

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn failed_load_drops_the_previous_document() {
    let path = write_document("replaced.txt", &MANUAL.repeat(20));
    let missing = std::env::temp_dir().join("docqa-no-such-file.txt");
    let mut session = build_session(&offline_cli()).unwrap();

    let mut out = Vec::new();
    session.handle(Command::Load(path.clone()), &mut out).await.unwrap();
    assert!(output(out).contains("Ready: 4 chunks indexed."));

    let mut out = Vec::new();
    assert!(session.handle(Command::Load(missing), &mut out).await.unwrap());
    assert!(output(out).contains("Something went wrong"));
    assert!(session.document().is_none());

    let mut out = Vec::new();
    let question = parse_command("How often is descaling needed?");
    assert!(session.handle(question, &mut out).await.unwrap());
    let printed = output(out);
    assert!(printed.contains("No document loaded yet"));
    assert!(!printed.contains("Answer:"));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn quit_stops_the_console() {
    let mut session = build_session(&offline_cli()).unwrap();
    let mut out = Vec::new();
    assert!(!session.handle(parse_command(":quit"), &mut out).await.unwrap());
}
