//! Sample statement commands

use anyhow::Result;

use spendsense_core::sample::{sample_upload, SAMPLE_TRANSACTIONS_CSV};
use spendsense_core::{InferenceBackend, InferenceGateway};

use super::analyze::{analyze_upload, render_summary};

/// Print the built-in sample CSV
pub fn cmd_sample_print() -> Result<()> {
    print!("{}", SAMPLE_TRANSACTIONS_CSV);
    Ok(())
}

/// Analyze the built-in sample and print the summary
pub async fn cmd_sample_analyze<B: InferenceBackend>(gateway: &InferenceGateway<B>) -> Result<()> {
    let dashboard = analyze_upload(gateway, &sample_upload()).await?;
    print!("{}", render_summary(&dashboard));
    Ok(())
}
