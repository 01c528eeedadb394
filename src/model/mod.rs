//! Model resolution: from "I need an LLM meeting criteria C" to one live binding.
//!
//! - [`ProviderBinding`](binding::ProviderBinding) is a connected model with pricing and capability metadata
//! - [`ProviderRegistry`](registry::ProviderRegistry) holds every binding registered for a process
//! - [`ModelSelector`](selector::ModelSelector) resolves a [`ModelSelectionCriteria`](criteria::ModelSelectionCriteria)
//! - [`config`] connects configured models through a [`ProviderConnector`](config::ProviderConnector)

pub mod binding;
pub mod config;
pub mod criteria;
pub mod registry;
pub mod selector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::ToolGroup;
use crate::error::ModelError;
use criteria::ModelSelectionCriteria;

/// A callable model endpoint, materialized by a provider connector.
///
/// Transport is the implementor's concern; callers simply await the result.
#[async_trait]
pub trait ModelHandle: Send + Sync {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Tool groups granted to the calling action, passed through untouched.
    #[serde(default)]
    pub tool_groups: Vec<ToolGroup>,
}

impl ModelRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        ModelRequest {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            temperature: None,
            tool_groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        ModelResponse {
            content: content.into(),
            usage: None,
        }
    }
}

/// What an action asks for when it needs a model.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmOptions {
    pub criteria: ModelSelectionCriteria,
    pub temperature: Option<f32>,
    pub system: Option<String>,
}

impl LlmOptions {
    pub fn new(criteria: ModelSelectionCriteria) -> Self {
        LlmOptions {
            criteria,
            temperature: None,
            system: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        LlmOptions::new(ModelSelectionCriteria::by_name(name))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Persona or role text sent as the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

impl Default for LlmOptions {
    fn default() -> Self {
        LlmOptions::new(ModelSelectionCriteria::Default)
    }
}
