//! Analyze command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use spendsense_core::{
    dashboard_to_csv, export_file_name, AnalysisPipeline, DashboardData, InferenceBackend,
    InferenceGateway, UploadedFile,
};

use super::truncate;

/// Read a statement from disk, optionally overriding the inferred MIME type
pub fn load_upload(path: &Path, mime: Option<&str>) -> Result<UploadedFile> {
    let mut file = UploadedFile::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(mime) = mime {
        file.mime_type = mime.to_string();
    }
    Ok(file)
}

/// Run one pipeline invocation
pub async fn analyze_upload<B: InferenceBackend>(
    gateway: &InferenceGateway<B>,
    file: &UploadedFile,
) -> Result<DashboardData> {
    AnalysisPipeline::new(gateway)
        .run(file)
        .await
        .map_err(|e| {
            let message = e.user_message();
            anyhow::Error::new(e).context(message)
        })
}

/// Export target: a directory gets the dated default file name
pub fn resolve_export_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(export_file_name(chrono::Local::now().date_naive()))
    } else {
        path.to_path_buf()
    }
}

/// Write the annotated transactions as CSV, returning the file written
pub fn export_dashboard(dashboard: &DashboardData, path: &Path) -> Result<PathBuf> {
    let target = resolve_export_path(path);
    let csv = dashboard_to_csv(dashboard).context("Failed to build CSV export")?;
    std::fs::write(&target, csv)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}

/// Human-readable dashboard summary
pub fn render_summary(dashboard: &DashboardData) -> String {
    let stats = &dashboard.stats;
    let mut out = String::from("📊 Spending Summary\n==================\n\n");

    out.push_str(&format!(
        "  Transactions: {}\n",
        dashboard.transactions.len()
    ));
    out.push_str(&format!("  Total spent:  ${:.2}\n\n", stats.total_spent));

    out.push_str("🏷️  By category:\n");
    let mut categories: Vec<_> = stats.category_totals.iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(a.1));
    for (category, total) in categories {
        out.push_str(&format!("  {:<15} ${:>10.2}\n", category.as_str(), total));
    }
    out.push('\n');

    out.push_str("📅 Daily spending:\n");
    for day in &stats.daily_spending {
        out.push_str(&format!("  {:<12} ${:>10.2}\n", day.date, day.amount));
    }
    out.push('\n');

    let anomalies: Vec<_> = dashboard.anomalies().collect();
    if anomalies.is_empty() {
        out.push_str("✅ No unusual transactions\n");
    } else {
        out.push_str(&format!(
            "⚠️  Unusual transactions ({}):\n",
            anomalies.len()
        ));
        for tx in anomalies {
            out.push_str(&format!(
                "  {:<12} {:<30} ${:>10.2}  {}\n",
                tx.date(),
                truncate(tx.description(), 30),
                tx.amount(),
                tx.anomaly_reason.as_deref().unwrap_or("")
            ));
        }
    }
    out.push('\n');

    out.push_str("💡 Savings tips:\n");
    for (i, tip) in dashboard.savings_tips.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} (save ~${:.2}/month)\n",
            i + 1,
            tip.tip,
            tip.estimated_savings
        ));
    }

    out
}

pub async fn cmd_analyze<B: InferenceBackend>(
    gateway: &InferenceGateway<B>,
    path: &Path,
    mime: Option<&str>,
    export_csv: Option<&Path>,
    json: bool,
) -> Result<()> {
    let file = load_upload(path, mime)?;
    let dashboard = analyze_upload(gateway, &file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print!("{}", render_summary(&dashboard));
    }

    if let Some(export_path) = export_csv {
        let written = export_dashboard(&dashboard, export_path)?;
        // Keep stdout clean for --json
        eprintln!(
            "📁 Exported {} transactions to {}",
            dashboard.transactions.len(),
            written.display()
        );
    }

    Ok(())
}
