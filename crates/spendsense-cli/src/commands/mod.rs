//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Run the pipeline on a file and print or export the result
//! - `backend` - Inference backend configuration and health
//! - `prompts` - Prompt library management commands
//! - `sample` - Built-in sample statement
//! - `serve` - Web server command

pub mod analyze;
pub mod backend;
pub mod prompts;
pub mod sample;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use backend::*;
pub use prompts::*;
pub use sample::*;
pub use serve::*;

use anyhow::Result;
use spendsense_core::InferenceGateway;

/// Gateway for the backend selected by the environment
pub fn gateway_from_env() -> Result<InferenceGateway> {
    InferenceGateway::from_env().ok_or_else(|| {
        anyhow::anyhow!(
            "No inference backend configured. Set OPENAI_COMPATIBLE_HOST \
             (and optionally OPENAI_COMPATIBLE_MODEL), or AI_BACKEND=mock for offline use."
        )
    })
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
