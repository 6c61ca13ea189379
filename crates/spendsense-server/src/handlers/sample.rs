//! Built-in sample statement

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use spendsense_core::sample::{SAMPLE_FILE_NAME, SAMPLE_TRANSACTIONS_CSV};

/// GET /api/sample - Download the sample CSV
pub async fn get_sample() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", SAMPLE_FILE_NAME),
            ),
        ],
        SAMPLE_TRANSACTIONS_CSV,
    )
        .into_response()
}
