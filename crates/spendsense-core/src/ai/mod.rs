//! Pluggable inference backend abstraction
//!
//! # Architecture
//!
//! - `InferenceBackend` trait: the four remote capabilities plus health info
//! - `InferenceClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - `InferenceGateway`: request/response validation and per-call timeouts
//!   around any backend
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let gateway = InferenceGateway::from_env().expect("no backend configured");
//! let categorized = gateway.categorize(&transactions).await?;
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod gateway;
mod mock;
mod openai_compatible;
pub mod parsing;
pub mod types;
pub mod validate;

pub use crate::capabilities::Capability;
pub use gateway::InferenceGateway;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;

use crate::capabilities::CapabilityRouter;
use crate::error::Result;

/// Trait defining the remote capabilities a backend must provide
///
/// Implementations only transport requests and decode responses; semantic
/// validation and timeouts live in `InferenceGateway`.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Assign a category to each transaction, same order and count
    async fn categorize(&self, request: &CategorizeRequest) -> Result<CategorizeResponse>;

    /// Flag unusual transactions by index
    async fn detect_anomalies(
        &self,
        request: &DetectAnomaliesRequest,
    ) -> Result<DetectAnomaliesResponse>;

    /// Personalized savings tips with estimated monthly savings
    async fn suggest_savings_tips(
        &self,
        request: &SavingsTipsRequest,
    ) -> Result<SavingsTipsResponse>;

    /// Extract transactions from a PDF statement
    async fn extract_from_document(
        &self,
        request: &ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the default model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete inference client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum InferenceClient {
    /// OpenAI-compatible backend (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing and offline demos
    Mock(MockBackend),
}

impl InferenceClient {
    /// Create a client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `openai_compatible` (default): Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Deterministic offline backend
    ///
    /// The OpenAI-compatible backend picks models through `router`, the same
    /// router the gateway uses for timeouts.
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env(router: CapabilityRouter) -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env(router).map(InferenceClient::OpenAICompatible)
            }
            "mock" => Some(InferenceClient::mock()),
            _ => {
                tracing::warn!(
                    backend = %backend,
                    "Unknown AI_BACKEND, falling back to openai_compatible"
                );
                OpenAICompatibleBackend::from_env(router).map(InferenceClient::OpenAICompatible)
            }
        }
    }

    /// Create a mock backend
    pub fn mock() -> Self {
        InferenceClient::Mock(MockBackend::new())
    }

    /// Name of the active backend kind
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceClient::OpenAICompatible(_) => "openai_compatible",
            InferenceClient::Mock(_) => "mock",
        }
    }

    /// Create a new instance with a different default model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            InferenceClient::OpenAICompatible(b) => {
                InferenceClient::OpenAICompatible(b.with_model(model))
            }
            InferenceClient::Mock(b) => InferenceClient::Mock(b.with_model(model)),
        }
    }
}

// Implement InferenceBackend for InferenceClient by delegating to the inner backend
#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn categorize(&self, request: &CategorizeRequest) -> Result<CategorizeResponse> {
        match self {
            InferenceClient::OpenAICompatible(b) => b.categorize(request).await,
            InferenceClient::Mock(b) => b.categorize(request).await,
        }
    }

    async fn detect_anomalies(
        &self,
        request: &DetectAnomaliesRequest,
    ) -> Result<DetectAnomaliesResponse> {
        match self {
            InferenceClient::OpenAICompatible(b) => b.detect_anomalies(request).await,
            InferenceClient::Mock(b) => b.detect_anomalies(request).await,
        }
    }

    async fn suggest_savings_tips(
        &self,
        request: &SavingsTipsRequest,
    ) -> Result<SavingsTipsResponse> {
        match self {
            InferenceClient::OpenAICompatible(b) => b.suggest_savings_tips(request).await,
            InferenceClient::Mock(b) => b.suggest_savings_tips(request).await,
        }
    }

    async fn extract_from_document(
        &self,
        request: &ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse> {
        match self {
            InferenceClient::OpenAICompatible(b) => b.extract_from_document(request).await,
            InferenceClient::Mock(b) => b.extract_from_document(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            InferenceClient::OpenAICompatible(b) => b.health_check().await,
            InferenceClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            InferenceClient::OpenAICompatible(b) => b.model(),
            InferenceClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            InferenceClient::OpenAICompatible(b) => b.host(),
            InferenceClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_client_mock() {
        let client = InferenceClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
        assert_eq!(client.kind(), "mock");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = InferenceClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_client_delegates_categorize() {
        let client = InferenceClient::mock();
        let response = client
            .categorize(&CategorizeRequest {
                transactions: vec![WireTransaction {
                    date: "2024-01-01".into(),
                    description: "Netflix".into(),
                    amount: 15.99,
                }],
            })
            .await
            .unwrap();
        assert_eq!(
            response.categorized_transactions[0].category,
            crate::models::Category::Entertainment
        );
    }
}
