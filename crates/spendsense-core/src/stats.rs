//! Spending statistics over categorized transactions
//!
//! Pure functions: total monthly spend and the per-category median that the
//! anomaly detector judges each transaction against.

use std::collections::BTreeMap;

use crate::models::{CategorizedTransaction, Category};

/// Sum of all amounts, signed
pub fn total_monthly_spend(transactions: &[CategorizedTransaction]) -> f64 {
    transactions.iter().map(|t| t.transaction.amount).sum()
}

/// Median of a set of values
///
/// Odd count gives the middle value, even count the mean of the two middle
/// values. None for an empty set.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median amount per category, for categories that occur
pub fn median_category_spend(transactions: &[CategorizedTransaction]) -> BTreeMap<Category, f64> {
    let mut amounts: BTreeMap<Category, Vec<f64>> = BTreeMap::new();
    for tx in transactions {
        amounts
            .entry(tx.category)
            .or_default()
            .push(tx.transaction.amount);
    }

    amounts
        .into_iter()
        .filter_map(|(category, values)| median(&values).map(|m| (category, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTransaction;

    fn tx(amount: f64, category: Category) -> CategorizedTransaction {
        CategorizedTransaction {
            transaction: RawTransaction::new("2024-01-01", "x", amount),
            category,
        }
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(median(&[40.0, 10.0, 30.0, 20.0]), Some(25.0));
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_median_unsorted_with_negatives() {
        assert_eq!(median(&[5.0, -20.0, 100.0]), Some(5.0));
    }

    #[test]
    fn test_total_monthly_spend() {
        let txs = vec![tx(5.0, Category::Food), tx(1500.0, Category::Bills)];
        assert_eq!(total_monthly_spend(&txs), 1505.0);
        assert_eq!(total_monthly_spend(&[]), 0.0);
        // Refunds reduce the total
        let txs = vec![tx(50.0, Category::Shopping), tx(-20.0, Category::Shopping)];
        assert_eq!(total_monthly_spend(&txs), 30.0);
    }

    #[test]
    fn test_median_category_spend() {
        let txs = vec![
            tx(10.0, Category::Food),
            tx(30.0, Category::Food),
            tx(20.0, Category::Food),
            tx(1500.0, Category::Bills),
            tx(100.0, Category::Bills),
        ];
        let medians = median_category_spend(&txs);
        assert_eq!(medians.len(), 2);
        assert_eq!(medians[&Category::Food], 20.0);
        assert_eq!(medians[&Category::Bills], 800.0);
        assert!(!medians.contains_key(&Category::Health));
    }
}
