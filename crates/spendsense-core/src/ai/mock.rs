//! Mock backend for testing
//!
//! Deterministic stand-in for a model server. Categorizes by keyword,
//! flags anomalies with simple statistical rules and derives tips from the
//! largest spending groups. Useful for unit tests, offline demos and
//! development without a running LLM server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::capabilities::Capability;
use crate::error::{Error, Result};
use crate::ingest::parse_csv;
use crate::models::{AnomalyFlag, Category, SavingsTip};

use super::types::{
    CategorizeRequest, CategorizeResponse, DetectAnomaliesRequest, DetectAnomaliesResponse,
    ExtractDocumentRequest, ExtractDocumentResponse, SavingsTipsRequest, SavingsTipsResponse,
    WireCategorizedTransaction, WireTransaction,
};
use super::InferenceBackend;

/// Amount above this multiple of the category median is unusual
const MEDIAN_MULTIPLE: f64 = 3.0;
/// Single transaction above this share of the month is unusual
const MONTHLY_SHARE: f64 = 0.2;
/// Savings rate suggested for the 1st, 2nd and 3rd largest spending group
const TIP_RATES: [f64; 3] = [0.10, 0.15, 0.20];
/// Savings rate for the fallback budget tip
const BUDGET_RATE: f64 = 0.05;

const CATEGORY_KEYWORDS: &[(Category, &str)] = &[
    (
        Category::Food,
        r"coffee|cafe|restaurant|grocer(y|ies)|supermarket|pizza|burger|bakery|deli|starbucks|uber eats|doordash|lunch|dinner|food|whole foods|trader joe",
    ),
    (
        Category::Transport,
        r"uber|lyft|taxi|fuel|gas station|shell|chevron|parking|metro|transit|train|airline|bus|toll",
    ),
    (
        Category::Bills,
        r"rent|mortgage|electric|utilit(y|ies)|water|internet|phone|insurance|bill|comcast|verizon",
    ),
    (
        Category::Entertainment,
        r"netflix|spotify|hulu|disney|cinema|movie|theat(er|re)|concert|steam|games?",
    ),
    (
        Category::Health,
        r"pharmacy|doctor|dental|dentist|hospital|clinic|gym|fitness|cvs|walgreens|health",
    ),
    (
        Category::Shopping,
        r"amazon|target|walmart|ikea|best buy|store|shop|mall|clothing|electronics",
    ),
];

fn keyword_patterns() -> &'static [(Category, Regex)] {
    static PATTERNS: OnceLock<Vec<(Category, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CATEGORY_KEYWORDS
            .iter()
            .filter_map(|(category, words)| {
                Regex::new(&format!(r"(?i)\b({})\b", words))
                    .ok()
                    .map(|re| (*category, re))
            })
            .collect()
    })
}

/// Keyword categorization; anything unmatched is Misc
pub fn categorize_description(description: &str) -> Category {
    keyword_patterns()
        .iter()
        .find(|(_, re)| re.is_match(description))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Misc)
}

/// Lowercased description with digits and punctuation removed, so
/// "NETFLIX.COM 0412" and "Netflix.com 0513" share a shape
fn description_shape(description: &str) -> String {
    description
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mock inference backend
///
/// Clones share the call counter, so a test can keep a handle while the
/// gateway owns another.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    model: String,
    fail_on: Option<Capability>,
    malformed_on: Option<Capability>,
    latency: Option<Duration>,
    document_rows: Vec<WireTransaction>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            model: "mock".to_string(),
            fail_on: None,
            malformed_on: None,
            latency: None,
            document_rows: vec![
                WireTransaction {
                    date: "2024-01-15".to_string(),
                    description: "Grocery Store".to_string(),
                    amount: 82.45,
                },
                WireTransaction {
                    date: "2024-01-16".to_string(),
                    description: "Electric Company".to_string(),
                    amount: 120.0,
                },
            ],
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Create a new instance with a different model name
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Fail every call of `capability` with a remote failure
    pub fn failing_on(mut self, capability: Capability) -> Self {
        self.fail_on = Some(capability);
        self
    }

    /// Return a response for `capability` that decodes but breaks the contract
    pub fn malformed_on(mut self, capability: Capability) -> Self {
        self.malformed_on = Some(capability);
        self
    }

    /// Delay every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Rows returned by document extraction
    pub fn with_document_rows(mut self, rows: Vec<WireTransaction>) -> Self {
        self.document_rows = rows;
        self
    }

    /// Number of capability calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Record a call and apply latency and failure injection
    async fn enter(&self, capability: Capability) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_on == Some(capability) {
            return Err(Error::remote(capability, "injected failure"));
        }
        Ok(self.malformed_on == Some(capability))
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn categorize(&self, request: &CategorizeRequest) -> Result<CategorizeResponse> {
        let malformed = self.enter(Capability::Categorize).await?;

        let mut categorized_transactions: Vec<_> = request
            .transactions
            .iter()
            .map(|tx| WireCategorizedTransaction {
                date: tx.date.clone(),
                description: tx.description.clone(),
                amount: tx.amount,
                category: categorize_description(&tx.description),
            })
            .collect();
        if malformed {
            categorized_transactions.pop();
        }

        Ok(CategorizeResponse {
            categorized_transactions,
        })
    }

    async fn detect_anomalies(
        &self,
        request: &DetectAnomaliesRequest,
    ) -> Result<DetectAnomaliesResponse> {
        if self.enter(Capability::DetectAnomalies).await? {
            return Ok(DetectAnomaliesResponse {
                anomalies: vec![AnomalyFlag {
                    transaction_index: request.transactions.len(),
                    is_anomalous: true,
                    reason: "out of range".to_string(),
                }],
            });
        }

        let mut shape_counts: HashMap<String, usize> = HashMap::new();
        for tx in &request.transactions {
            *shape_counts
                .entry(description_shape(&tx.description))
                .or_default() += 1;
        }

        let anomalies = request
            .transactions
            .iter()
            .enumerate()
            .filter_map(|(index, tx)| {
                let mut reasons = Vec::new();
                if tx.median_category_spend > 0.0
                    && tx.amount > MEDIAN_MULTIPLE * tx.median_category_spend
                {
                    reasons.push(format!(
                        "{:.2} is more than {}x the median {} spend of {:.2}",
                        tx.amount, MEDIAN_MULTIPLE, tx.category, tx.median_category_spend
                    ));
                }
                if tx.monthly_spend > 0.0 && tx.amount > MONTHLY_SHARE * tx.monthly_spend {
                    reasons.push(format!(
                        "{:.2} is over {:.0}% of total monthly spend",
                        tx.amount,
                        MONTHLY_SHARE * 100.0
                    ));
                }
                let unique = shape_counts
                    .get(&description_shape(&tx.description))
                    .copied()
                    == Some(1);
                if unique && tx.median_category_spend > 0.0 && tx.amount > tx.median_category_spend
                {
                    reasons.push("one-off charge above the category median".to_string());
                }

                (!reasons.is_empty()).then(|| AnomalyFlag {
                    transaction_index: index,
                    is_anomalous: true,
                    reason: reasons.join("; "),
                })
            })
            .collect();

        Ok(DetectAnomaliesResponse { anomalies })
    }

    async fn suggest_savings_tips(
        &self,
        request: &SavingsTipsRequest,
    ) -> Result<SavingsTipsResponse> {
        let malformed = self.enter(Capability::SuggestSavingsTips).await?;

        // Group by description shape, largest absolute spend first
        let transactions = parse_csv(&request.spending_data).unwrap_or_default();
        let mut groups: Vec<(String, String, f64)> = Vec::new();
        for tx in &transactions {
            let shape = description_shape(&tx.description);
            match groups.iter_mut().find(|(s, _, _)| *s == shape) {
                Some(group) => group.2 += tx.amount.abs(),
                None => groups.push((shape, tx.description.clone(), tx.amount.abs())),
            }
        }
        groups.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut savings_tips: Vec<SavingsTip> = groups
            .iter()
            .zip(TIP_RATES)
            .map(|((_, description, total), rate)| SavingsTip {
                tip: format!(
                    "Cut spending on {} by {:.0}% next month.",
                    description,
                    rate * 100.0
                ),
                estimated_savings: round_cents(total * rate),
            })
            .collect();

        while savings_tips.len() < TIP_RATES.len() {
            savings_tips.push(SavingsTip {
                tip: format!(
                    "Set a monthly budget {:.0}% below your current total of {:.2}.",
                    BUDGET_RATE * 100.0,
                    request.total_monthly_spend.abs()
                ),
                estimated_savings: round_cents(request.total_monthly_spend.abs() * BUDGET_RATE),
            });
        }

        if malformed {
            savings_tips[0].estimated_savings = -1.0;
        }

        Ok(SavingsTipsResponse { savings_tips })
    }

    async fn extract_from_document(
        &self,
        _request: &ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse> {
        let malformed = self.enter(Capability::ExtractFromDocument).await?;

        let mut transactions = self.document_rows.clone();
        if malformed {
            transactions.push(WireTransaction {
                date: "01/17/2024".to_string(),
                description: "Bad date".to_string(),
                amount: 1.0,
            });
        }
        Ok(ExtractDocumentResponse { transactions })
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
