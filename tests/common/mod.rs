//! Shared test fixtures: a mock Ollama/OpenAI backend served by axum.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Requests received by the mock, as (path, authorization header, body).
#[derive(Clone, Default)]
pub struct Recorded(pub Arc<Mutex<Vec<(String, Option<String>, Value)>>>);

impl Recorded {
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| p == path)
            .map(|(_, _, b)| b.clone())
            .collect()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.0.lock().unwrap().iter().map(|(_, a, _)| a.clone()).collect()
    }

    fn push(&self, path: &str, headers: &HeaderMap, body: &Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.0
            .lock()
            .unwrap()
            .push((path.to_string(), auth, body.clone()));
    }
}

#[derive(Clone)]
struct MockState {
    dims: usize,
    recorded: Recorded,
}

/// Deterministic bag-of-words embedding into `dims` buckets.
pub fn embed_text(text: &str, dims: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dims];
    for word in text.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.is_empty() {
            continue;
        }
        let mut h: u64 = 0xcbf29ce484222325;
        for b in word.bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        v[(h % dims as u64) as usize] += 1.0;
    }
    if v.iter().all(|x| *x == 0.0) {
        v[0] = 1.0;
    }
    v
}

async fn ollama_embeddings(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.recorded.push("/api/embeddings", &headers, &body);
    let prompt = body["prompt"].as_str().unwrap_or_default();
    Json(json!({ "embedding": embed_text(prompt, state.dims) }))
}

async fn ollama_generate(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.recorded.push("/api/generate", &headers, &body);
    let prompt = body["prompt"].as_str().unwrap_or_default();
    let grounded = prompt.starts_with("Context:\n");
    Json(json!({ "response": format!("MOCK ANSWER grounded={}", grounded), "done": true }))
}

async fn openai_embeddings(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.recorded.push("/v1/embeddings", &headers, &body);
    let inputs: Vec<String> = body["input"]
        .as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    // Reverse order on the wire; clients must sort by `index`.
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, text)| json!({"object": "embedding", "index": i, "embedding": embed_text(text, state.dims)}))
        .collect();
    Json(json!({ "object": "list", "data": data, "model": body["model"] }))
}

async fn openai_chat(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.recorded.push("/v1/chat/completions", &headers, &body);
    let grounded = body["messages"][0]["role"] == "system";
    Json(json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("MOCK CHAT grounded={}", grounded)},
            "finish_reason": "stop"
        }]
    }))
}

pub fn mock_router(dims: usize, recorded: Recorded) -> Router {
    Router::new()
        .route("/api/embeddings", post(ollama_embeddings))
        .route("/api/generate", post(ollama_generate))
        .route("/v1/embeddings", post(openai_embeddings))
        .route("/v1/chat/completions", post(openai_chat))
        .with_state(MockState { dims, recorded })
}

/// Serve `router` on an ephemeral port from the current runtime.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve the mock backend from a background thread with its own runtime,
/// for tests that drive the CLI binary synchronously.
pub fn spawn_mock_backend(dims: usize) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = mock_router(dims, recorded.clone());
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });

    (format!("http://{}", rx.recv().unwrap()), recorded)
}

/// A base URL nothing listens on.
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
