//! SpendSense Web Server
//!
//! Axum-based REST API exposing the analysis pipeline to an upload UI.
//!
//! Every analyze request is an independent pipeline invocation; the server
//! keeps no per-user state between requests.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Upload size limit
//! - Security response headers
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use spendsense_core::{InferenceBackend, InferenceGateway};

mod handlers;

/// Default maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and headers around the file part
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            max_upload_bytes: MAX_UPLOAD_SIZE,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub gateway: InferenceGateway,
    pub config: ServerConfig,
}

/// Build the application router
pub fn create_router(
    gateway: InferenceGateway,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    let backend = gateway.backend();
    info!(
        "Inference backend: {} at {} (model: {})",
        backend.kind(),
        backend.host(),
        backend.model()
    );

    let upload_limit = config.max_upload_bytes + MULTIPART_OVERHEAD;
    let state = Arc::new(AppState {
        gateway,
        config: config.clone(),
    });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/analyze",
            post(handlers::analyze_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/analyze/sample", post(handlers::analyze_sample))
        .route("/sample", get(handlers::get_sample))
        .route("/export/csv", post(handlers::export_csv));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .expose_headers([header::CONTENT_DISPOSITION])
    };

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    gateway: InferenceGateway,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_backend_connection(&gateway).await;

    let app = create_router(gateway, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log whether the inference backend answers before accepting requests
async fn check_backend_connection(gateway: &InferenceGateway) {
    let backend = gateway.backend();
    if backend.health_check().await {
        info!("Inference backend reachable: {}", backend.host());
    } else {
        warn!(
            "Inference backend configured but not responding: {} (analyses will fail until it is up)",
            backend.host()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<spendsense_core::Error> for AppError {
    fn from(err: spendsense_core::Error) -> Self {
        use spendsense_core::Error;

        let status = match &err {
            Error::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::NoTransactionsFound | Error::InvalidCsv(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::SchemaViolation { .. } | Error::RemoteCapabilityFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => {
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    // Return generic message to client
                    message: "An internal error occurred".to_string(),
                    internal: Some(err.into()),
                }
            }
        };

        warn!(status = status.as_u16(), error = %err, "Analysis request failed");
        Self {
            status,
            message: err.user_message(),
            internal: None,
        }
    }
}
