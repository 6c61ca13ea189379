//! Inference gateway
//!
//! Wraps a backend with the contract every capability call obeys: the
//! request is validated before dispatch, the call runs under its capability
//! timeout, and the response is validated before anything downstream sees
//! it. A failure at any of those points is terminal. There are no retries.

use std::future::Future;

use tracing::{debug, info};

use crate::capabilities::{Capability, CapabilityRouter};
use crate::error::{Error, Result};
use crate::models::{AnomalyFlag, CategorizedTransaction, RawTransaction, SavingsTip};

use super::types::{
    AnomalyInput, CategorizeRequest, DetectAnomaliesRequest, ExtractDocumentRequest,
    SavingsTipsRequest, WireTransaction,
};
use super::{validate, InferenceBackend, InferenceClient};

/// Schema-checked access to the remote capabilities
#[derive(Clone)]
pub struct InferenceGateway<B = InferenceClient> {
    backend: B,
    router: CapabilityRouter,
}

impl InferenceGateway<InferenceClient> {
    /// Build a gateway from environment variables and the capability config
    ///
    /// Returns None if no backend is configured.
    pub fn from_env() -> Option<Self> {
        let router = CapabilityRouter::load_or_default();
        let client = InferenceClient::from_env(router.clone())?;
        Some(Self::with_router(client, router))
    }
}

impl<B: InferenceBackend> InferenceGateway<B> {
    /// Gateway with default timeouts
    pub fn new(backend: B) -> Self {
        Self::with_router(backend, CapabilityRouter::default())
    }

    pub fn with_router(backend: B, router: CapabilityRouter) -> Self {
        Self { backend, router }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    /// Run one remote call under its capability timeout
    async fn dispatch<T>(
        &self,
        capability: Capability,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout = self.router.timeout_for(capability);
        debug!(
            capability = %capability,
            timeout_secs = timeout.as_secs(),
            host = self.backend.host(),
            "Dispatching capability call"
        );
        let start = std::time::Instant::now();

        let result = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| Error::remote(capability, format!("timed out after {:?}", timeout)))?;

        info!(
            capability = %capability,
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Capability call finished"
        );
        result
    }

    /// Assign a category to every transaction, preserving order and count
    ///
    /// Categories are attached to the input transactions by position, so
    /// extra columns survive categorization.
    pub async fn categorize(
        &self,
        transactions: &[RawTransaction],
    ) -> Result<Vec<CategorizedTransaction>> {
        let request = CategorizeRequest {
            transactions: transactions.iter().map(WireTransaction::from).collect(),
        };
        validate::categorize_request(&request)?;

        let response = self
            .dispatch(Capability::Categorize, self.backend.categorize(&request))
            .await?;
        validate::categorize_response(&request, &response)?;

        Ok(transactions
            .iter()
            .zip(response.categorized_transactions)
            .map(|(tx, categorized)| CategorizedTransaction {
                transaction: tx.clone(),
                category: categorized.category,
            })
            .collect())
    }

    /// Flag unusual transactions; indices refer to positions in `inputs`
    pub async fn detect_anomalies(&self, inputs: Vec<AnomalyInput>) -> Result<Vec<AnomalyFlag>> {
        let request = DetectAnomaliesRequest {
            transactions: inputs,
        };
        validate::detect_anomalies_request(&request)?;

        let response = self
            .dispatch(
                Capability::DetectAnomalies,
                self.backend.detect_anomalies(&request),
            )
            .await?;
        validate::detect_anomalies_response(&request, &response)?;

        Ok(response.anomalies)
    }

    pub async fn suggest_savings_tips(
        &self,
        spending_data: &str,
        total_monthly_spend: f64,
    ) -> Result<Vec<SavingsTip>> {
        let request = SavingsTipsRequest {
            spending_data: spending_data.to_string(),
            total_monthly_spend,
        };
        validate::savings_tips_request(&request)?;

        let response = self
            .dispatch(
                Capability::SuggestSavingsTips,
                self.backend.suggest_savings_tips(&request),
            )
            .await?;
        validate::savings_tips_response(&response)?;

        Ok(response.savings_tips)
    }

    /// Extract transactions from a PDF given as a base64 data URI
    pub async fn extract_from_document(&self, pdf_data_uri: &str) -> Result<Vec<RawTransaction>> {
        let request = ExtractDocumentRequest {
            pdf_data_uri: pdf_data_uri.to_string(),
        };
        validate::extract_request(&request)?;

        let response = self
            .dispatch(
                Capability::ExtractFromDocument,
                self.backend.extract_from_document(&request),
            )
            .await?;
        validate::extract_response(&response)?;

        Ok(response
            .transactions
            .into_iter()
            .map(RawTransaction::from)
            .collect())
    }
}
