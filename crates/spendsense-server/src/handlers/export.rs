//! CSV export of a dashboard

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::AppError;
use spendsense_core::{dashboard_to_csv, export_file_name, DashboardData};

/// POST /api/export/csv - Download annotated transactions as CSV
///
/// The body is the `DashboardData` previously returned by an analyze call.
pub async fn export_csv(Json(data): Json<DashboardData>) -> Result<Response, AppError> {
    let csv = dashboard_to_csv(&data)?;
    let filename = export_file_name(chrono::Local::now().date_naive());

    info!(
        transactions = data.transactions.len(),
        filename = %filename,
        "Exported dashboard CSV"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
