//! HTTP backends against an in-process mock of the OpenAI-compatible API.
//!
//! Each test starts an axum server on an ephemeral port, points the
//! backend's `url` at it, and inspects both the result and the requests the
//! server received.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use faq_relay::app::build_relay_with;
use faq_relay::config::{load_config, EmbeddingConfig, GenerationConfig};
use faq_relay::embedding::OpenAIEmbedder;
use faq_relay::generation::OpenAIChat;
use faq_relay_core::embedding::Embedder;
use faq_relay_core::generation::AnswerGenerator;
use faq_relay_core::RelayError;

#[derive(Clone, Copy)]
enum Mode {
    Ok,
    ServerError,
    Unauthorized,
    Malformed,
    Slow,
}

#[derive(Clone)]
struct MockState {
    mode: Mode,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl MockState {
    fn record(&self, headers: &HeaderMap, body: &Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.requests.lock().unwrap().push((auth, body.clone()));
    }

    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

/// Deterministic 3-d vector from keyword presence.
fn vectorize(text: &str) -> Value {
    let t = text.to_lowercase();
    json!([
        if t.contains("spam") { 1.0 } else { 0.0 },
        if t.contains("kind") { 1.0 } else { 0.0 },
        if t.contains("rule") { 1.0 } else { 0.0 }
    ])
}

async fn embeddings(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record(&headers, &body);
    match state.mode {
        Mode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "upstream failure" } })),
        ),
        Mode::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "invalid api key" } })),
        ),
        Mode::Malformed => (StatusCode::OK, Json(json!({ "object": "list" }))),
        Mode::Ok | Mode::Slow => {
            let inputs = body["input"].as_array().cloned().unwrap_or_default();
            let data: Vec<Value> = inputs
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    json!({
                        "object": "embedding",
                        "index": i,
                        "embedding": vectorize(text.as_str().unwrap_or_default()),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "object": "list", "data": data })))
        }
    }
}

async fn chat_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.record(&headers, &body);
    match state.mode {
        Mode::ServerError => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": { "message": "overloaded" } })),
        ),
        Mode::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "invalid api key" } })),
        ),
        Mode::Malformed => (StatusCode::OK, Json(json!({ "id": "chatcmpl-1" }))),
        Mode::Slow => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Json(json!({ "choices": [] })))
        }
        Mode::Ok => {
            let system = body["messages"][0]["content"].as_str().unwrap_or_default();
            let rules = system.matches("Rule:").count();
            let question = body["messages"][1]["content"].as_str().unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": format!("{} rules apply to: {}", rules, question),
                        },
                        "finish_reason": "stop"
                    }]
                })),
            )
        }
    }
}

/// Start the mock and return its base URL.
async fn start_mock(mode: Mode) -> (String, MockState) {
    let state = MockState {
        mode,
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn embedder_for(url: &str) -> OpenAIEmbedder {
    let config = EmbeddingConfig {
        url: Some(url.to_string()),
        model: Some("text-embedding-test".to_string()),
        ..EmbeddingConfig::default()
    };
    OpenAIEmbedder::with_api_key(&config, "sk-test".to_string()).unwrap()
}

fn chat_for(url: &str, timeout_secs: u64) -> OpenAIChat {
    let config = GenerationConfig {
        url: Some(url.to_string()),
        model: "gpt-test".to_string(),
        timeout_secs,
        ..GenerationConfig::default()
    };
    OpenAIChat::with_api_key(&config, "sk-test".to_string()).unwrap()
}

// ─── Embeddings ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_embeddings_request_and_response() {
    let (url, state) = start_mock(Mode::Ok).await;
    let embedder = embedder_for(&url);

    let texts = vec!["Rule: no spam".to_string(), "be kind".to_string()];
    let vectors = embedder.embed(&texts).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]]);

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "text-embedding-test");
    assert_eq!(body["input"], json!(["Rule: no spam", "be kind"]));
}

#[tokio::test]
async fn test_openai_embeddings_server_error_not_retried() {
    let (url, state) = start_mock(Mode::ServerError).await;
    let embedder = embedder_for(&url);

    let err = embedder.embed(&["hello".to_string()]).await.unwrap_err();
    assert!(matches!(err, RelayError::EmbeddingService(_)));
    assert!(err.to_string().contains("500"));
    assert_eq!(state.requests().len(), 1);
}

#[tokio::test]
async fn test_openai_embeddings_malformed_response() {
    let (url, _state) = start_mock(Mode::Malformed).await;
    let err = embedder_for(&url)
        .embed(&["hello".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::EmbeddingService(_)));
}

#[tokio::test]
async fn test_embeddings_connection_refused() {
    // Bind and drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = embedder_for(&format!("http://{}", addr))
        .embed(&["hello".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::EmbeddingService(_)));
}

// ─── Chat completions ───────────────────────────────────────────────

#[tokio::test]
async fn test_chat_sends_two_messages_at_zero_temperature() {
    let (url, state) = start_mock(Mode::Ok).await;
    let chat = chat_for(&url, 30);

    let answer = chat
        .generate("Rule: no spam\n\nRule: be kind", "What are the rules?")
        .await
        .unwrap();
    assert_eq!(answer, "2 rules apply to: What are the rules?");

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["temperature"], 0);
    assert_eq!(body["stream"], false);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "What are the rules?");
}

#[tokio::test]
async fn test_chat_auth_failure() {
    let (url, state) = start_mock(Mode::Unauthorized).await;
    let err = chat_for(&url, 30).generate("sys", "q").await.unwrap_err();
    assert!(matches!(err, RelayError::GenerationService(_)));
    assert!(err.to_string().contains("401"));
    assert_eq!(state.requests().len(), 1);
}

#[tokio::test]
async fn test_chat_server_error_not_retried() {
    let (url, state) = start_mock(Mode::ServerError).await;
    let err = chat_for(&url, 30).generate("sys", "q").await.unwrap_err();
    assert!(matches!(err, RelayError::GenerationService(_)));
    assert_eq!(state.requests().len(), 1);
}

#[tokio::test]
async fn test_chat_malformed_response() {
    let (url, _state) = start_mock(Mode::Malformed).await;
    let err = chat_for(&url, 30).generate("sys", "q").await.unwrap_err();
    assert!(matches!(err, RelayError::GenerationService(_)));
}

#[tokio::test]
async fn test_chat_timeout() {
    let (url, _state) = start_mock(Mode::Slow).await;
    let err = chat_for(&url, 1).generate("sys", "q").await.unwrap_err();
    assert!(matches!(err, RelayError::GenerationService(_)));
}

// ─── Full pipeline ──────────────────────────────────────────────────

#[tokio::test]
async fn test_startup_and_answer_through_http_backends() {
    let (url, state) = start_mock(Mode::Ok).await;

    let tmp = TempDir::new().unwrap();
    let corpus_path = tmp.path().join("data.txt");
    fs::write(&corpus_path, "Rule: no spam\n---\nRule: be kind\n").unwrap();
    let config_path = tmp.path().join("relay.toml");
    fs::write(
        &config_path,
        format!(
            r#"[corpus]
path = "{}"

[embedding]
url = "{url}"

[generation]
url = "{url}"

[discord]
target_channel_id = 1411802805995569162
"#,
            corpus_path.display().to_string().replace('\\', "/"),
            url = url
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let embedder =
        Arc::new(OpenAIEmbedder::with_api_key(&config.embedding, "sk-test".to_string()).unwrap());
    let generator =
        Arc::new(OpenAIChat::with_api_key(&config.generation, "sk-test".to_string()).unwrap());

    let relay = build_relay_with(&config, embedder, generator).await.unwrap();
    let answer = relay.answer("What are the rules?").await.unwrap();
    assert_eq!(answer, "2 rules apply to: What are the rules?");

    // index build, query embedding, chat completion
    let requests = state.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].1["input"], json!(["Rule: no spam", "Rule: be kind"]));
    assert_eq!(requests[1].1["input"], json!(["What are the rules?"]));
    let system = requests[2].1["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("Rule: no spam\n\nRule: be kind"));
}

#[tokio::test]
async fn test_startup_fails_on_missing_corpus() {
    let (url, _state) = start_mock(Mode::Ok).await;
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("relay.toml");
    fs::write(
        &config_path,
        format!(
            "[corpus]\npath = \"{}\"\n\n[discord]\ntarget_channel_id = 5\n",
            tmp.path().join("missing.txt").display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let result = build_relay_with(
        &config,
        Arc::new(embedder_for(&url)),
        Arc::new(chat_for(&url, 30)),
    )
    .await;
    let err = result.err().unwrap();
    assert!(matches!(
        err.downcast_ref::<RelayError>(),
        Some(RelayError::CorpusUnavailable { .. })
    ));
}
