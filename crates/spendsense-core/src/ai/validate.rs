//! Semantic validation of capability requests and responses
//!
//! Decoding already guarantees shape and enumerations (an unknown category
//! never deserializes). These checks cover what a type cannot express:
//! cardinality, index bounds, finite numbers and date formats.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::warn;

use crate::capabilities::Capability;
use crate::error::{Error, Result};

use super::types::{
    CategorizeRequest, CategorizeResponse, DetectAnomaliesRequest, DetectAnomaliesResponse,
    ExtractDocumentRequest, ExtractDocumentResponse, SavingsTipsRequest, SavingsTipsResponse,
};

pub const PDF_DATA_URI_PREFIX: &str = "data:application/pdf;base64,";

/// Number of tips the savings capability is asked for
pub const EXPECTED_TIP_COUNT: usize = 3;

fn finite(capability: Capability, field: &str, index: usize, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::schema(
            capability,
            format!("{} at position {} is not a finite number", field, index),
        ))
    }
}

pub fn categorize_request(request: &CategorizeRequest) -> Result<()> {
    let cap = Capability::Categorize;
    if request.transactions.is_empty() {
        return Err(Error::schema(cap, "request has no transactions"));
    }
    for (i, tx) in request.transactions.iter().enumerate() {
        finite(cap, "Amount", i, tx.amount)?;
    }
    Ok(())
}

pub fn categorize_response(
    request: &CategorizeRequest,
    response: &CategorizeResponse,
) -> Result<()> {
    let expected = request.transactions.len();
    let got = response.categorized_transactions.len();
    if got != expected {
        return Err(Error::schema(
            Capability::Categorize,
            format!("expected {} categorized transactions, got {}", expected, got),
        ));
    }
    Ok(())
}

pub fn detect_anomalies_request(request: &DetectAnomaliesRequest) -> Result<()> {
    let cap = Capability::DetectAnomalies;
    if request.transactions.is_empty() {
        return Err(Error::schema(cap, "request has no transactions"));
    }
    for (i, tx) in request.transactions.iter().enumerate() {
        finite(cap, "amount", i, tx.amount)?;
        finite(cap, "monthlySpend", i, tx.monthly_spend)?;
        finite(cap, "medianCategorySpend", i, tx.median_category_spend)?;
    }
    Ok(())
}

/// Indices must address the request sequence. Repeated indices are allowed
/// but logged; consumers take the first flag for a position.
pub fn detect_anomalies_response(
    request: &DetectAnomaliesRequest,
    response: &DetectAnomaliesResponse,
) -> Result<()> {
    let len = request.transactions.len();
    let mut seen = HashSet::new();
    for flag in &response.anomalies {
        if flag.transaction_index >= len {
            return Err(Error::schema(
                Capability::DetectAnomalies,
                format!(
                    "transactionIndex {} out of range for {} transactions",
                    flag.transaction_index, len
                ),
            ));
        }
        if !seen.insert(flag.transaction_index) {
            warn!(
                index = flag.transaction_index,
                "Duplicate anomaly flag, keeping the first"
            );
        }
    }
    Ok(())
}

pub fn savings_tips_request(request: &SavingsTipsRequest) -> Result<()> {
    let cap = Capability::SuggestSavingsTips;
    if request.spending_data.trim().is_empty() {
        return Err(Error::schema(cap, "spendingData is empty"));
    }
    finite(cap, "totalMonthlySpend", 0, request.total_monthly_spend)
}

pub fn savings_tips_response(response: &SavingsTipsResponse) -> Result<()> {
    let cap = Capability::SuggestSavingsTips;
    if response.savings_tips.is_empty() {
        return Err(Error::schema(cap, "no savings tips returned"));
    }
    for (i, tip) in response.savings_tips.iter().enumerate() {
        if tip.tip.trim().is_empty() {
            return Err(Error::schema(cap, format!("tip at position {} is empty", i)));
        }
        finite(cap, "estimatedSavings", i, tip.estimated_savings)?;
        if tip.estimated_savings < 0.0 {
            return Err(Error::schema(
                cap,
                format!("estimatedSavings at position {} is negative", i),
            ));
        }
    }
    if response.savings_tips.len() != EXPECTED_TIP_COUNT {
        warn!(
            count = response.savings_tips.len(),
            expected = EXPECTED_TIP_COUNT,
            "Unexpected number of savings tips"
        );
    }
    Ok(())
}

pub fn extract_request(request: &ExtractDocumentRequest) -> Result<()> {
    let payload = request
        .pdf_data_uri
        .strip_prefix(PDF_DATA_URI_PREFIX)
        .ok_or_else(|| {
            Error::schema(
                Capability::ExtractFromDocument,
                format!("document must be a {} URI", PDF_DATA_URI_PREFIX),
            )
        })?;
    if payload.is_empty() {
        return Err(Error::schema(
            Capability::ExtractFromDocument,
            "document payload is empty",
        ));
    }
    Ok(())
}

/// Extracted dates must be `YYYY-MM-DD`
pub fn extract_response(response: &ExtractDocumentResponse) -> Result<()> {
    let cap = Capability::ExtractFromDocument;
    for (i, tx) in response.transactions.iter().enumerate() {
        let well_formed =
            tx.date.len() == 10 && NaiveDate::parse_from_str(&tx.date, "%Y-%m-%d").is_ok();
        if !well_formed {
            return Err(Error::schema(
                cap,
                format!("Date '{}' at position {} is not YYYY-MM-DD", tx.date, i),
            ));
        }
        finite(cap, "Amount", i, tx.amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::{AnomalyInput, WireCategorizedTransaction, WireTransaction};
    use crate::models::{AnomalyFlag, Category, SavingsTip};

    fn wire(date: &str, amount: f64) -> WireTransaction {
        WireTransaction {
            date: date.into(),
            description: "x".into(),
            amount,
        }
    }

    fn anomaly_input(amount: f64) -> AnomalyInput {
        AnomalyInput {
            date: "2024-01-01".into(),
            description: "x".into(),
            amount,
            category: Category::Misc,
            monthly_spend: 100.0,
            median_category_spend: 10.0,
        }
    }

    fn flag(index: usize) -> AnomalyFlag {
        AnomalyFlag {
            transaction_index: index,
            is_anomalous: true,
            reason: "r".into(),
        }
    }

    #[test]
    fn test_categorize_request_rules() {
        let empty = CategorizeRequest {
            transactions: vec![],
        };
        assert!(categorize_request(&empty).is_err());

        let nan = CategorizeRequest {
            transactions: vec![wire("2024-01-01", f64::NAN)],
        };
        assert!(categorize_request(&nan).is_err());

        let ok = CategorizeRequest {
            transactions: vec![wire("2024-01-01", -3.5)],
        };
        assert!(categorize_request(&ok).is_ok());
    }

    #[test]
    fn test_categorize_response_cardinality() {
        let request = CategorizeRequest {
            transactions: vec![wire("2024-01-01", 1.0), wire("2024-01-02", 2.0)],
        };
        let one = CategorizeResponse {
            categorized_transactions: vec![WireCategorizedTransaction {
                date: "2024-01-01".into(),
                description: "x".into(),
                amount: 1.0,
                category: Category::Misc,
            }],
        };
        let err = categorize_response(&request, &one).unwrap_err();
        assert!(err.to_string().contains("expected 2 categorized transactions, got 1"));
    }

    #[test]
    fn test_detect_response_index_bounds() {
        let request = DetectAnomaliesRequest {
            transactions: vec![anomaly_input(1.0), anomaly_input(2.0)],
        };
        let ok = DetectAnomaliesResponse {
            anomalies: vec![flag(1), flag(1), flag(0)],
        };
        assert!(detect_anomalies_response(&request, &ok).is_ok());

        let bad = DetectAnomaliesResponse {
            anomalies: vec![flag(2)],
        };
        assert!(detect_anomalies_response(&request, &bad).is_err());

        let empty = DetectAnomaliesResponse { anomalies: vec![] };
        assert!(detect_anomalies_response(&request, &empty).is_ok());
    }

    #[test]
    fn test_detect_request_rejects_infinite_context() {
        let mut input = anomaly_input(1.0);
        input.monthly_spend = f64::INFINITY;
        let request = DetectAnomaliesRequest {
            transactions: vec![input],
        };
        let err = detect_anomalies_request(&request).unwrap_err();
        assert!(err.to_string().contains("monthlySpend"));
    }

    #[test]
    fn test_savings_tips_rules() {
        let request = SavingsTipsRequest {
            spending_data: "  ".into(),
            total_monthly_spend: 10.0,
        };
        assert!(savings_tips_request(&request).is_err());

        let tip = |t: &str, s: f64| SavingsTip {
            tip: t.into(),
            estimated_savings: s,
        };
        let two = SavingsTipsResponse {
            savings_tips: vec![tip("a", 1.0), tip("b", 0.0)],
        };
        assert!(savings_tips_response(&two).is_ok());

        let negative = SavingsTipsResponse {
            savings_tips: vec![tip("a", -1.0)],
        };
        assert!(savings_tips_response(&negative).is_err());

        let blank = SavingsTipsResponse {
            savings_tips: vec![tip(" ", 1.0)],
        };
        assert!(savings_tips_response(&blank).is_err());

        let none = SavingsTipsResponse {
            savings_tips: vec![],
        };
        assert!(savings_tips_response(&none).is_err());
    }

    #[test]
    fn test_extract_rules() {
        let bad_uri = ExtractDocumentRequest {
            pdf_data_uri: "data:image/png;base64,AAAA".into(),
        };
        assert!(extract_request(&bad_uri).is_err());

        let empty = ExtractDocumentRequest {
            pdf_data_uri: PDF_DATA_URI_PREFIX.into(),
        };
        assert!(extract_request(&empty).is_err());

        let ok = ExtractDocumentResponse {
            transactions: vec![wire("2024-01-15", 82.45)],
        };
        assert!(extract_response(&ok).is_ok());

        for date in ["01/15/2024", "2024-1-5", "2024-02-30"] {
            let bad = ExtractDocumentResponse {
                transactions: vec![wire(date, 1.0)],
            };
            assert!(extract_response(&bad).is_err(), "{} should be rejected", date);
        }
    }
}
