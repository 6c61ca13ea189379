//! CSV export of annotated transactions

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::DashboardData;

const HEADER: [&str; 6] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "IsAnomalous",
    "AnomalyReason",
];

/// One row per transaction, in dashboard order
///
/// Fields containing a quote, comma or line break are quoted with inner
/// quotes doubled. A missing anomaly reason is an empty field.
pub fn dashboard_to_csv(data: &DashboardData) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for tx in &data.transactions {
        let amount = tx.amount().to_string();
        writer.write_record([
            tx.date(),
            tx.description(),
            amount.as_str(),
            tx.category().as_str(),
            if tx.is_anomalous { "true" } else { "false" },
            tx.anomaly_reason.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// `spendsense-data-YYYY-MM-DD.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("spendsense-data-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{
        AnnotatedTransaction, CategorizedTransaction, Category, RawTransaction, SpendingStats,
    };

    fn annotated(
        description: &str,
        amount: f64,
        category: Category,
        reason: Option<&str>,
    ) -> AnnotatedTransaction {
        AnnotatedTransaction {
            transaction: CategorizedTransaction {
                transaction: RawTransaction::new("2024-01-01", description, amount),
                category,
            },
            is_anomalous: reason.is_some(),
            anomaly_reason: reason.map(String::from),
        }
    }

    fn dashboard(transactions: Vec<AnnotatedTransaction>) -> DashboardData {
        DashboardData {
            transactions,
            savings_tips: vec![],
            stats: SpendingStats {
                total_spent: 0.0,
                category_totals: BTreeMap::new(),
                daily_spending: vec![],
            },
        }
    }

    #[test]
    fn test_dashboard_to_csv() {
        let data = dashboard(vec![
            annotated("Coffee", 5.0, Category::Food, None),
            annotated("Rent", 1500.5, Category::Bills, Some("Over 20% of monthly spend")),
        ]);

        let csv = dashboard_to_csv(&data).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Date,Description,Amount,Category,IsAnomalous,AnomalyReason",
                "2024-01-01,Coffee,5,Food,false,",
                "2024-01-01,Rent,1500.5,Bills,true,Over 20% of monthly spend",
            ]
        );
    }

    #[test]
    fn test_dashboard_to_csv_quotes_when_needed() {
        let data = dashboard(vec![annotated(
            "Joe's \"Best\" Pizza, Downtown",
            20.0,
            Category::Food,
            Some("Unusual, one-off"),
        )]);

        let csv = dashboard_to_csv(&data).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            r#"2024-01-01,"Joe's ""Best"" Pizza, Downtown",20,Food,true,"Unusual, one-off""#
        );
    }

    #[test]
    fn test_dashboard_to_csv_empty() {
        let csv = dashboard_to_csv(&dashboard(vec![])).unwrap();
        assert_eq!(
            csv,
            "Date,Description,Amount,Category,IsAnomalous,AnomalyReason\n"
        );
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "spendsense-data-2024-03-07.csv");
    }
}
