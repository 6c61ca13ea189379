//! Analysis handlers

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::{AppError, AppState};
use spendsense_core::ingest::mime_type_for_path;
use spendsense_core::sample::sample_upload;
use spendsense_core::{AnalysisPipeline, DashboardData, UploadedFile};

const OCTET_STREAM: &str = "application/octet-stream";

/// POST /api/analyze - Analyze an uploaded statement
///
/// Expects multipart form with:
/// - file: CSV or PDF statement (required, max 10MB by default)
pub async fn analyze_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DashboardData>, AppError> {
    let max = state.config.max_upload_bytes;
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let declared = field
            .content_type()
            .map(str::trim)
            .filter(|ct| !ct.is_empty() && *ct != OCTET_STREAM)
            .map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;

        if bytes.len() > max {
            return Err(AppError::bad_request(&format!(
                "File too large. Maximum size is {} MB",
                max / 1024 / 1024
            )));
        }

        let mime_type = declared.unwrap_or_else(|| {
            file_name
                .as_deref()
                .map(|n| mime_type_for_path(Path::new(n)))
                .unwrap_or(OCTET_STREAM)
                .to_string()
        });

        let mut file = UploadedFile::new(mime_type, bytes.to_vec());
        file.name = file_name;
        upload = Some(file);
    }

    let file = upload.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    run_analysis(&state, file).await
}

/// POST /api/analyze/sample - Analyze the built-in sample statement
pub async fn analyze_sample(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardData>, AppError> {
    run_analysis(&state, sample_upload()).await
}

async fn run_analysis(state: &AppState, file: UploadedFile) -> Result<Json<DashboardData>, AppError> {
    info!(
        file = file.name.as_deref().unwrap_or("<unnamed>"),
        mime_type = %file.mime_type,
        size = file.content.len(),
        "Analysis requested"
    );

    let dashboard = AnalysisPipeline::new(&state.gateway).run(&file).await?;
    Ok(Json(dashboard))
}
