//! Analysis pipeline: uploaded file → dashboard data
//!
//! Stages run strictly in order and each consumes the previous stage's
//! output. Any stage failure abandons the whole invocation; no partial
//! dashboard is ever produced.
//!
//! Anomaly flags refer to positions in the categorized sequence, so that
//! sequence is never reordered or filtered between detection and merge.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::aggregate::build_stats;
use crate::ai::{AnomalyInput, InferenceBackend, InferenceGateway};
use crate::error::Result;
use crate::ingest::{ingest, UploadedFile};
use crate::models::{
    AnnotatedTransaction, AnomalyFlag, CategorizedTransaction, Category, DashboardData,
};
use crate::stats::{median_category_spend, total_monthly_spend};

/// Runs one analysis per `run` call against a shared gateway
pub struct AnalysisPipeline<'a, B: InferenceBackend> {
    gateway: &'a InferenceGateway<B>,
}

impl<'a, B: InferenceBackend> AnalysisPipeline<'a, B> {
    pub fn new(gateway: &'a InferenceGateway<B>) -> Self {
        Self { gateway }
    }

    pub async fn run(&self, file: &UploadedFile) -> Result<DashboardData> {
        let start = std::time::Instant::now();

        let ingested = ingest(file, self.gateway).await?;

        let categorized = self.gateway.categorize(&ingested.transactions).await?;
        debug!("Categorized {} transactions", categorized.len());

        let total = total_monthly_spend(&categorized);
        let medians = median_category_spend(&categorized);

        let flags = self
            .gateway
            .detect_anomalies(anomaly_inputs(&categorized, total, &medians))
            .await?;

        let savings_tips = self
            .gateway
            .suggest_savings_tips(&ingested.spending_data, total)
            .await?;

        let transactions = merge_anomalies(categorized, &flags);
        let stats = build_stats(total, &transactions);

        let dashboard = DashboardData {
            transactions,
            savings_tips,
            stats,
        };

        info!(
            transactions = dashboard.transactions.len(),
            anomalies = dashboard.anomalies().count(),
            total_spent = dashboard.stats.total_spent,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(dashboard)
    }
}

/// Detector inputs, one per categorized transaction in the same order
pub fn anomaly_inputs(
    categorized: &[CategorizedTransaction],
    monthly_spend: f64,
    medians: &BTreeMap<Category, f64>,
) -> Vec<AnomalyInput> {
    categorized
        .iter()
        .map(|tx| AnomalyInput {
            date: tx.transaction.date.clone(),
            description: tx.transaction.description.clone(),
            amount: tx.transaction.amount,
            category: tx.category,
            monthly_spend,
            median_category_spend: medians.get(&tx.category).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Attach anomaly flags to the transactions they index
///
/// The first flag for a position wins. A reason is only kept when that flag
/// marks the transaction anomalous.
pub fn merge_anomalies(
    categorized: Vec<CategorizedTransaction>,
    flags: &[AnomalyFlag],
) -> Vec<AnnotatedTransaction> {
    categorized
        .into_iter()
        .enumerate()
        .map(|(index, transaction)| {
            let flag = flags.iter().find(|f| f.transaction_index == index);
            let is_anomalous = flag.is_some_and(|f| f.is_anomalous);
            AnnotatedTransaction {
                transaction,
                is_anomalous,
                anomaly_reason: flag.filter(|f| f.is_anomalous).map(|f| f.reason.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Capability, MockBackend};
    use crate::error::Error;
    use crate::models::RawTransaction;

    fn categorized(n: usize) -> Vec<CategorizedTransaction> {
        (0..n)
            .map(|i| CategorizedTransaction {
                transaction: RawTransaction::new("2024-01-01", format!("tx {}", i), i as f64),
                category: Category::Misc,
            })
            .collect()
    }

    fn flag(index: usize, is_anomalous: bool, reason: &str) -> AnomalyFlag {
        AnomalyFlag {
            transaction_index: index,
            is_anomalous,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_merge_anomalies_by_index() {
        let flags = vec![flag(0, true, "big"), flag(2, true, "odd")];
        let merged = merge_anomalies(categorized(3), &flags);

        assert_eq!(merged.len(), 3);
        assert!(merged[0].is_anomalous);
        assert_eq!(merged[0].anomaly_reason.as_deref(), Some("big"));
        assert!(!merged[1].is_anomalous);
        assert!(merged[1].anomaly_reason.is_none());
        assert!(merged[2].is_anomalous);
        assert_eq!(merged[2].anomaly_reason.as_deref(), Some("odd"));
    }

    #[test]
    fn test_merge_first_flag_wins_and_non_anomalous_drops_reason() {
        let flags = vec![
            flag(0, false, "looked fine"),
            flag(0, true, "second opinion"),
            flag(1, true, "first"),
            flag(1, false, "later"),
        ];
        let merged = merge_anomalies(categorized(2), &flags);
        assert!(!merged[0].is_anomalous);
        assert!(merged[0].anomaly_reason.is_none());
        assert!(merged[1].is_anomalous);
        assert_eq!(merged[1].anomaly_reason.as_deref(), Some("first"));
    }

    #[test]
    fn test_anomaly_inputs_carry_context() {
        let mut txs = categorized(2);
        txs[1].category = Category::Bills;
        let mut medians = BTreeMap::new();
        medians.insert(Category::Misc, 0.0);
        medians.insert(Category::Bills, 1.0);

        let inputs = anomaly_inputs(&txs, 1.0, &medians);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[1].category, Category::Bills);
        assert_eq!(inputs[1].median_category_spend, 1.0);
        assert!(inputs.iter().all(|i| i.monthly_spend == 1.0));

        let inputs = anomaly_inputs(&txs, 1.0, &BTreeMap::new());
        assert!(inputs.iter().all(|i| i.median_category_spend == 0.0));
    }

    #[tokio::test]
    async fn test_run_aborts_on_stage_failure() {
        let backend = MockBackend::new().failing_on(Capability::DetectAnomalies);
        let gateway = InferenceGateway::new(backend.clone());
        let file = UploadedFile::new("text/csv", "Date,Description,Amount\n2024-01-01,Coffee,5");

        let err = AnalysisPipeline::new(&gateway).run(&file).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteCapabilityFailure {
                capability: Capability::DetectAnomalies,
                ..
            }
        ));
        // categorize + detect; tips never requested
        assert_eq!(backend.call_count(), 2);
    }
}
