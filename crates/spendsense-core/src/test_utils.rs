//! Test utilities for spendsense-core
//!
//! A mock OpenAI-compatible chat server for integration tests and local
//! development. Replies are chosen by the structured-output schema name the
//! client sends, and computed by `MockBackend` from the transactions
//! embedded in the prompt.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::{
    CategorizeRequest, DetectAnomaliesRequest, ExtractDocumentRequest, InferenceBackend,
    MockBackend, SavingsTipsRequest,
};
use crate::capabilities::Capability;

#[derive(Clone)]
enum Mode {
    /// Compute replies with the mock backend
    Backend(MockBackend),
    /// Reply to every completion with this text
    Fixed(String),
    /// Answer every completion with HTTP 500
    Failing,
}

/// Mock chat-completions server
pub struct MockChatServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::spawn(Mode::Backend(MockBackend::new())).await
    }

    /// Start a server whose replies are always `content`
    pub async fn start_with_reply(content: &str) -> Self {
        Self::spawn(Mode::Fixed(content.to_string())).await
    }

    /// Start a server that fails every completion
    pub async fn start_failing() -> Self {
        Self::spawn(Mode::Failing).await
    }

    async fn spawn(mode: Mode) -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_completion))
            .with_state(Arc::new(mode));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [{"id": "mock-model", "object": "model"}]
    }))
}

async fn handle_completion(State(mode): State<Arc<Mode>>, Json(request): Json<Value>) -> Response {
    let content = match mode.as_ref() {
        Mode::Failing => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        Mode::Fixed(text) => text.clone(),
        Mode::Backend(backend) => backend_reply(backend, &request).await,
    };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

/// Rebuild the typed request from the prompt and answer with the mock backend
async fn backend_reply(backend: &MockBackend, request: &Value) -> String {
    let capability = request["response_format"]["json_schema"]["name"]
        .as_str()
        .and_then(|n| n.parse::<Capability>().ok());
    let user = user_text(request);

    let reply = match capability {
        Some(Capability::Categorize) => {
            let transactions = first_json_array(&user).unwrap_or_default();
            backend
                .categorize(&CategorizeRequest { transactions })
                .await
                .map(|r| serde_json::to_string(&r))
        }
        Some(Capability::DetectAnomalies) => {
            let transactions = first_json_array(&user).unwrap_or_default();
            backend
                .detect_anomalies(&DetectAnomaliesRequest { transactions })
                .await
                .map(|r| serde_json::to_string(&r))
        }
        Some(Capability::SuggestSavingsTips) => {
            let spending_data = user
                .split_once("(CSV):\n")
                .and_then(|(_, rest)| rest.split("\n\nRespond with").next())
                .unwrap_or_default()
                .to_string();
            backend
                .suggest_savings_tips(&SavingsTipsRequest {
                    spending_data,
                    total_monthly_spend: 0.0,
                })
                .await
                .map(|r| serde_json::to_string(&r))
        }
        Some(Capability::ExtractFromDocument) | None => backend
            .extract_from_document(&ExtractDocumentRequest {
                pdf_data_uri: String::new(),
            })
            .await
            .map(|r| serde_json::to_string(&r)),
    };

    match reply {
        Ok(Ok(text)) => text,
        _ => String::new(),
    }
}

/// Text of the last user message, from plain or multipart content
fn user_text(request: &Value) -> String {
    let Some(message) = request["messages"]
        .as_array()
        .and_then(|m| m.iter().rev().find(|m| m["role"] == "user"))
    else {
        return String::new();
    };

    match &message["content"] {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Decode the first JSON array in `text`, ignoring anything after it
fn first_json_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let start = text.find('[')?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<Vec<T>>()
        .next()?
        .ok()
}
