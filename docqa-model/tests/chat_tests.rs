//! `ChatCompletionsModel` against an in-process fake chat-completions server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use docqa_model::{ChatCompletionsModel, ChatConfig};
use docqa_rag::{CompletionError, CompletionModel};
use serde_json::{Value, json};

/// What the fake server saw, and how it should answer.
#[derive(Clone)]
struct FakeServer {
    reply: Arc<dyn Fn() -> Response + Send + Sync>,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_handler(
    State(server): State<FakeServer>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
    server.requests.lock().unwrap().push((auth, body));
    (server.reply)()
}

async fn spawn_server(
    reply: impl Fn() -> Response + Send + Sync + 'static,
) -> (String, FakeServer, tokio::task::JoinHandle<()>) {
    let server = FakeServer { reply: Arc::new(reply), requests: Arc::default() };
    let app =
        Router::new().route("/v1/chat/completions", post(chat_handler)).with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{addr}/v1"), server, handle)
}

fn answer(content: &str) -> Response {
    Json(json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
    .into_response()
}

fn model(base_url: &str) -> ChatCompletionsModel {
    ChatCompletionsModel::new(
        ChatConfig::compatible("test-key", base_url, "test-model").with_temperature(0.0),
    )
    .unwrap()
}

#[tokio::test]
async fn returns_first_choice_content() {
    let (base_url, server, handle) = spawn_server(|| answer("  Paris  ")).await;

    let reply = model(&base_url).complete("What is the capital of France?").await.unwrap();
    // The synthesizer trims; the client returns the raw text.
    assert_eq!(reply, "  Paris  ");

    let requests = server.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "What is the capital of France?");
    assert_eq!(body["temperature"], 0.0);
    assert!(body.get("max_tokens").is_none());

    handle.abort();
}

#[tokio::test]
async fn unauthorized_is_authentication_error() {
    let (base_url, _server, handle) = spawn_server(|| {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
    })
    .await;

    let err = model(&base_url).complete("hi").await.unwrap_err();
    assert_eq!(err, CompletionError::Authentication("Unauthorized".into()));

    handle.abort();
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let (base_url, _server, handle) = spawn_server(|| {
        let body = json!({ "error": { "message": "slow down" } });
        (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
    })
    .await;

    let err = model(&base_url).complete("hi").await.unwrap_err();
    assert_eq!(err, CompletionError::RateLimited("slow down".into()));

    handle.abort();
}

#[tokio::test]
async fn server_error_keeps_status() {
    let (base_url, _server, handle) =
        spawn_server(|| (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response()).await;

    let err = model(&base_url).complete("hi").await.unwrap_err();
    assert_eq!(err, CompletionError::Backend { status: 503, message: "overloaded".into() });

    handle.abort();
}

#[tokio::test]
async fn garbage_body_is_malformed_response() {
    let (base_url, _server, handle) = spawn_server(|| "not json".into_response()).await;

    let err = model(&base_url).complete("hi").await.unwrap_err();
    assert!(matches!(err, CompletionError::MalformedResponse(_)));

    handle.abort();
}

#[tokio::test]
async fn missing_choices_is_malformed_response() {
    let (base_url, _server, handle) =
        spawn_server(|| Json(json!({ "choices": [] })).into_response()).await;

    let err = model(&base_url).complete("hi").await.unwrap_err();
    assert!(matches!(err, CompletionError::MalformedResponse(_)));

    handle.abort();
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let model = ChatCompletionsModel::new(
        ChatConfig::compatible("k", "http://127.0.0.1:1/v1", "m")
            .with_request_timeout(Duration::from_secs(5)),
    )
    .unwrap();

    let err = model.complete("hi").await.unwrap_err();
    assert!(matches!(err, CompletionError::Network(_)));
}
