//! Liveness and backend status

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendsense_core::InferenceBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: BackendStatus,
}

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub kind: &'static str,
    pub host: String,
    pub model: String,
    pub healthy: bool,
}

/// GET /api/health - Server status and inference backend reachability
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backend = state.gateway.backend();
    Json(HealthResponse {
        status: "ok",
        backend: BackendStatus {
            kind: backend.kind(),
            host: backend.host().to_string(),
            model: backend.model().to_string(),
            healthy: backend.health_check().await,
        },
    })
}
