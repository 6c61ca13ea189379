//! Inference wire types
//!
//! Request and response payloads for the four remote capabilities. Every
//! response type derives `JsonSchema` so backends can ask the model for
//! structured output matching exactly what the gateway validates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{AnomalyFlag, Category, RawTransaction, SavingsTip};

/// Transaction as exchanged with the model (extra CSV columns stripped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WireTransaction {
    /// Calendar date, as found in the source
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
}

impl From<&RawTransaction> for WireTransaction {
    fn from(tx: &RawTransaction) -> Self {
        Self {
            date: tx.date.clone(),
            description: tx.description.clone(),
            amount: tx.amount,
        }
    }
}

impl From<WireTransaction> for RawTransaction {
    fn from(tx: WireTransaction) -> Self {
        RawTransaction::new(tx.date, tx.description, tx.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizeRequest {
    pub transactions: Vec<WireTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WireCategorizedTransaction {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Category")]
    pub category: Category,
}

/// One categorized transaction per input transaction, same order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeResponse {
    pub categorized_transactions: Vec<WireCategorizedTransaction>,
}

/// A categorized transaction with the context the detector judges it against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyInput {
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub monthly_spend: f64,
    pub median_category_spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectAnomaliesRequest {
    pub transactions: Vec<AnomalyInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectAnomaliesResponse {
    /// Flags for some or all input positions
    pub anomalies: Vec<AnomalyFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTipsRequest {
    /// CSV-like text of the analysed transactions
    pub spending_data: String,
    pub total_monthly_spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTipsResponse {
    pub savings_tips: Vec<SavingsTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractDocumentRequest {
    /// `data:application/pdf;base64,...`
    pub pdf_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractDocumentResponse {
    pub transactions: Vec<WireTransaction>,
}
