//! SpendSense Core Library
//!
//! Turns an uploaded bank statement into dashboard data:
//! - File ingestion for CSV exports and PDF statements
//! - Inference gateway with schema-checked remote capabilities
//!   (categorization, anomaly detection, savings tips, document extraction)
//! - Spending statistics and dashboard aggregates
//! - Analysis pipeline and per-session state machine
//! - Capability router for per-call models and timeouts
//! - Prompt library for customizable prompts
//! - CSV export of annotated transactions

pub mod aggregate;
pub mod ai;
pub mod capabilities;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod sample;
pub mod session;
pub mod stats;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    InferenceBackend, InferenceClient, InferenceGateway, MockBackend, OpenAICompatibleBackend,
};
pub use capabilities::{Capability, CapabilityRouter, RouterConfig};
pub use error::{Error, Result};
pub use export::{dashboard_to_csv, export_file_name};
pub use ingest::{UploadedFile, MIME_CSV, MIME_PDF};
pub use models::{
    AnnotatedTransaction, AnomalyFlag, CategorizedTransaction, Category, DailySpend,
    DashboardData, RawTransaction, SavingsTip, SpendingStats,
};
pub use pipeline::AnalysisPipeline;
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use session::{AnalysisSession, InvocationTicket, SessionState, TransitionError};
