//! Ollama connector for local inference

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ModelError;
use crate::model::config::{ModelProperties, ProviderConnector};
use crate::model::{ModelHandle, ModelRequest, ModelResponse, Usage};

const PROVIDER: &str = "Ollama";

/// Configuration for the Ollama connector
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server URL (default: http://localhost:11434)
    pub host: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
        }
    }
}

/// A message in Ollama's chat format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

impl OllamaMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Request structure for Ollama chat completions
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

impl OllamaChatRequest {
    pub fn from_request(request: ModelRequest) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(OllamaMessage::system(system));
        }
        messages.push(OllamaMessage::user(request.prompt));

        OllamaChatRequest {
            model: request.model,
            messages,
            stream: false,
            options: request
                .temperature
                .map(|t| OllamaOptions { temperature: Some(t) }),
        }
    }
}

/// Response from Ollama's chat endpoint
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message: OllamaMessage,
    pub done: bool,
    #[serde(default)]
    pub prompt_eval_count: u32,
    #[serde(default)]
    pub eval_count: u32,
}

impl From<OllamaChatResponse> for ModelResponse {
    fn from(response: OllamaChatResponse) -> Self {
        ModelResponse {
            content: response.message.content,
            usage: Some(Usage {
                input_tokens: response.prompt_eval_count,
                output_tokens: response.eval_count,
            }),
        }
    }
}

/// Model information from Ollama
#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    pub modified_at: DateTime<Utc>,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaModelsResponse {
    pub models: Vec<OllamaModel>,
}

/// Connects configured models to a local Ollama server.
///
/// Connecting a model lists the server's installed models and fails when the
/// configured name is not among them.
#[derive(Clone, Debug)]
pub struct OllamaConnector {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaConnector {
    pub fn new(config: OllamaConfig) -> Self {
        assert!(!config.host.is_empty(), "Ollama host cannot be empty");
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// List available models from Ollama
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>, ModelError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.host))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Provider {
                provider: PROVIDER.to_string(),
                message: format!("Failed to list models: HTTP {}", response.status()),
            });
        }

        let res: OllamaModelsResponse = response.json().await?;
        Ok(res.models)
    }
}

impl Default for OllamaConnector {
    fn default() -> Self {
        Self::new(OllamaConfig::default())
    }
}

#[async_trait]
impl ProviderConnector for OllamaConnector {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn verifies_connection(&self) -> bool {
        true
    }

    async fn connect(&self, model: &ModelProperties) -> Result<Arc<dyn ModelHandle>, ModelError> {
        let installed = self.list_models().await?;
        if !installed.iter().any(|m| m.name == model.name) {
            return Err(ModelError::InvalidModel(format!(
                "Model '{}' not found in Ollama available models",
                model.name
            )));
        }
        Ok(Arc::new(OllamaHandle {
            client: self.client.clone(),
            host: self.config.host.clone(),
        }))
    }
}

/// Calls `/api/chat` on one Ollama server.
pub struct OllamaHandle {
    client: reqwest::Client,
    host: String,
}

#[async_trait]
impl ModelHandle for OllamaHandle {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let payload = OllamaChatRequest::from_request(request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, error_text),
            });
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        if !chat_response.done {
            return Err(ModelError::InvalidResponse(format!(
                "Ollama returned an unfinished response for '{}'",
                chat_response.model
            )));
        }
        Ok(chat_response.into())
    }
}
