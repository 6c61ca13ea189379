//! Domain models for SpendSense
//!
//! JSON field names follow the dashboard contract: transaction fields are
//! capitalized (`Date`, `Description`, `Amount`, `Category`), everything else
//! is camelCase.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single dated financial movement as read from the uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    /// Signed currency value
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Additional CSV columns, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl RawTransaction {
    pub fn new(date: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
            extra: BTreeMap::new(),
        }
    }
}

/// Spending buckets. Every categorized transaction carries exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Health,
    Misc,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Entertainment => "Entertainment",
            Self::Health => "Health",
            Self::Misc => "Misc",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Shopping,
            Self::Bills,
            Self::Entertainment,
            Self::Health,
            Self::Misc,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub transaction: RawTransaction,
    #[serde(rename = "Category")]
    pub category: Category,
}

/// Anomaly verdict for the transaction at `transaction_index` of the
/// categorized sequence sent to the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFlag {
    pub transaction_index: usize,
    pub is_anomalous: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTransaction {
    #[serde(flatten)]
    pub transaction: CategorizedTransaction,
    pub is_anomalous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_reason: Option<String>,
}

impl AnnotatedTransaction {
    pub fn date(&self) -> &str {
        &self.transaction.transaction.date
    }

    pub fn description(&self) -> &str {
        &self.transaction.transaction.description
    }

    pub fn amount(&self) -> f64 {
        self.transaction.transaction.amount
    }

    pub fn category(&self) -> Category {
        self.transaction.category
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavingsTip {
    pub tip: String,
    /// Estimated monthly saving in currency units
    pub estimated_savings: f64,
}

/// One point of the daily spending series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingStats {
    pub total_spent: f64,
    /// Only categories that actually appear
    pub category_totals: BTreeMap<Category, f64>,
    /// Ascending by calendar date, one entry per distinct date string
    pub daily_spending: Vec<DailySpend>,
}

/// Root view model of one successful pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub transactions: Vec<AnnotatedTransaction>,
    pub savings_tips: Vec<SavingsTip>,
    pub stats: SpendingStats,
}

impl DashboardData {
    pub fn anomalies(&self) -> impl Iterator<Item = &AnnotatedTransaction> {
        self.transactions.iter().filter(|t| t.is_anomalous)
    }
}
