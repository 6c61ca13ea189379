//! Error types for SpendSense
//!
//! Every variant is terminal for the pipeline invocation that produced it.

use thiserror::Error;

use crate::ai::Capability;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}. Please upload a CSV or PDF.")]
    UnsupportedFileType(String),

    #[error("No transactions found in the file.")]
    NoTransactionsFound,

    #[error("Schema violation in {capability}: {detail}")]
    SchemaViolation {
        capability: Capability,
        detail: String,
    },

    #[error("Remote capability {capability} failed: {detail}")]
    RemoteCapabilityFailure {
        capability: Capability,
        detail: String,
    },

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn schema(capability: Capability, detail: impl Into<String>) -> Self {
        Error::SchemaViolation {
            capability,
            detail: detail.into(),
        }
    }

    pub fn remote(capability: Capability, detail: impl Into<String>) -> Self {
        Error::RemoteCapabilityFailure {
            capability,
            detail: detail.into(),
        }
    }

    /// Single human-readable message shown when an invocation is abandoned
    pub fn user_message(&self) -> String {
        match self {
            Error::UnsupportedFileType(_) | Error::NoTransactionsFound | Error::InvalidCsv(_) => {
                format!("{} Please check the file and try again.", self)
            }
            Error::SchemaViolation { .. } | Error::RemoteCapabilityFailure { .. } => format!(
                "{}. Please check your inference backend configuration and try again.",
                self
            ),
            _ => "An unexpected error occurred during processing.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
