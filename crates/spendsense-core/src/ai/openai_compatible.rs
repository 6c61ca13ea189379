//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - OpenAI (https://api.openai.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! Every call asks for structured output with the JSON schema of the
//! capability's response type. PDF statements go out as a `file` content part.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-4o-mini)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::{Capability, CapabilityRouter};
use crate::error::{Error, Result};
use crate::prompts::{PromptId, PromptLibrary};

use super::parsing::parse_response;
use super::types::{
    CategorizeRequest, CategorizeResponse, DetectAnomaliesRequest, DetectAnomaliesResponse,
    ExtractDocumentRequest, ExtractDocumentResponse, SavingsTipsRequest, SavingsTipsResponse,
};
use super::InferenceBackend;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const STATEMENT_FILE_NAME: &str = "statement.pdf";

/// OpenAI-compatible backend
///
/// # Example
///
/// ```rust,ignore
/// // OpenAI
/// export OPENAI_COMPATIBLE_HOST="https://api.openai.com"
/// export OPENAI_COMPATIBLE_MODEL="gpt-4o-mini"
/// export OPENAI_COMPATIBLE_API_KEY="sk-..."
///
/// // vLLM
/// export OPENAI_COMPATIBLE_HOST="http://192.168.1.100:8000"
/// export OPENAI_COMPATIBLE_MODEL="Qwen/Qwen2.5-7B-Instruct"
/// ```
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    router: Arc<CapabilityRouter>,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::new_with_router(base_url, model, CapabilityRouter::load_or_default())
    }

    /// Create a backend that routes models through an already loaded router
    pub fn new_with_router(base_url: &str, model: &str, router: CapabilityRouter) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            router: Arc::new(router),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    /// Use a specific capability router
    pub fn with_router(mut self, router: CapabilityRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// Use a specific prompt library
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(RwLock::new(prompts));
        self
    }

    /// Create a new instance with a different default model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Capability router used to pick the model per call
    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-4o-mini)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env(router: CapabilityRouter) -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model =
            std::env::var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();

        let mut backend = Self::new_with_router(&host, &model, router);
        backend.api_key = api_key;
        Some(backend)
    }

    /// Render the system and user messages for a capability
    fn render_prompt(
        &self,
        capability: Capability,
        vars: &HashMap<&str, &str>,
    ) -> Result<(String, String)> {
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::Prompt("Failed to acquire prompt library lock".into()))?;
        let template = prompts.get(PromptId::for_capability(capability))?;
        Ok((template.render_system(vars), template.render_user(vars)))
    }

    /// Run one structured chat completion and decode the reply as `T`
    async fn structured_completion<T: DeserializeOwned + JsonSchema>(
        &self,
        capability: Capability,
        vars: &HashMap<&str, &str>,
        attachment: Option<&str>,
    ) -> Result<T> {
        let (system, user) = self.render_prompt(capability, vars)?;

        let user_content = match attachment {
            Some(data_uri) => ChatContent::Parts(vec![
                ContentPart::Text { text: user },
                ContentPart::File {
                    file: FileData {
                        filename: STATEMENT_FILE_NAME.to_string(),
                        file_data: data_uri.to_string(),
                    },
                },
            ]),
            None => ChatContent::Text(user),
        };

        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        let request = ChatCompletionRequest {
            model: self.router.model_for(capability, &self.model).to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: ChatContent::Text(system),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            temperature: Some(0.1),
            response_format: Some(ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: capability.as_str().to_string(),
                    schema,
                },
            }),
            stream: false,
        };

        let content = self.chat_completion(capability, &request).await?;
        debug!(capability = %capability, "OpenAI-compatible response: {}", content);

        parse_response(capability, &content)
    }

    /// Make a chat completion request and return the first choice's text
    async fn chat_completion(
        &self,
        capability: Capability,
        request: &ChatCompletionRequest,
    ) -> Result<String> {
        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| Error::remote(capability, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(
                capability,
                format!("API error {}: {}", status, body),
            ));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::remote(capability, format!("invalid response body: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::remote(capability, "no content in response"))
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Chat message content (text or multimodal)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "file")]
    File { file: FileData },
}

#[derive(Debug, Serialize)]
struct FileData {
    filename: String,
    /// `data:application/pdf;base64,...`
    file_data: String,
}

/// Structured output request
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl InferenceBackend for OpenAICompatibleBackend {
    async fn categorize(&self, request: &CategorizeRequest) -> Result<CategorizeResponse> {
        let transactions = serde_json::to_string_pretty(&request.transactions)?;
        let mut vars = HashMap::new();
        vars.insert("transactions", transactions.as_str());

        self.structured_completion(Capability::Categorize, &vars, None)
            .await
    }

    async fn detect_anomalies(
        &self,
        request: &DetectAnomaliesRequest,
    ) -> Result<DetectAnomaliesResponse> {
        let transactions = serde_json::to_string_pretty(&request.transactions)?;
        let mut vars = HashMap::new();
        vars.insert("transactions", transactions.as_str());

        self.structured_completion(Capability::DetectAnomalies, &vars, None)
            .await
    }

    async fn suggest_savings_tips(
        &self,
        request: &SavingsTipsRequest,
    ) -> Result<SavingsTipsResponse> {
        let total = format!("{:.2}", request.total_monthly_spend);
        let mut vars = HashMap::new();
        vars.insert("spending_data", request.spending_data.as_str());
        vars.insert("total_monthly_spend", total.as_str());

        self.structured_completion(Capability::SuggestSavingsTips, &vars, None)
            .await
    }

    async fn extract_from_document(
        &self,
        request: &ExtractDocumentRequest,
    ) -> Result<ExtractDocumentResponse> {
        self.structured_completion(
            Capability::ExtractFromDocument,
            &HashMap::new(),
            Some(&request.pdf_data_uri),
        )
        .await
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        match req_builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
