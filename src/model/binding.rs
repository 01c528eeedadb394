use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::ModelError;
use crate::model::{ModelHandle, ModelRequest, ModelResponse, Usage};

/// How a binding's connection was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// The connector probed the provider and the model answered.
    Connected,
    /// The handle was built without contacting the provider.
    Unverified,
}

/// Cost of using a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PricingModel {
    PerToken {
        usd_per_1m_input_tokens: f64,
        usd_per_1m_output_tokens: f64,
    },
    Free,
}

impl PricingModel {
    pub fn per_token(usd_per_1m_input_tokens: f64, usd_per_1m_output_tokens: f64) -> Self {
        PricingModel::PerToken {
            usd_per_1m_input_tokens,
            usd_per_1m_output_tokens,
        }
    }

    pub fn cost_of(&self, usage: Usage) -> f64 {
        match self {
            PricingModel::PerToken {
                usd_per_1m_input_tokens,
                usd_per_1m_output_tokens,
            } => {
                (f64::from(usage.input_tokens) * usd_per_1m_input_tokens
                    + f64::from(usage.output_tokens) * usd_per_1m_output_tokens)
                    / 1_000_000.0
            }
            PricingModel::Free => 0.0,
        }
    }

    pub fn input_price(&self) -> f64 {
        match self {
            PricingModel::PerToken {
                usd_per_1m_input_tokens,
                ..
            } => *usd_per_1m_input_tokens,
            PricingModel::Free => 0.0,
        }
    }

    pub fn output_price(&self) -> f64 {
        match self {
            PricingModel::PerToken {
                usd_per_1m_output_tokens,
                ..
            } => *usd_per_1m_output_tokens,
            PricingModel::Free => 0.0,
        }
    }
}

/// A connected, usable model endpoint. Immutable once registered.
#[derive(Clone)]
pub struct ProviderBinding {
    name: String,
    provider: String,
    status: ConnectionStatus,
    pricing: PricingModel,
    knowledge_cutoff: Option<NaiveDate>,
    handle: Arc<dyn ModelHandle>,
}

impl ProviderBinding {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        pricing: PricingModel,
        handle: Arc<dyn ModelHandle>,
    ) -> Self {
        ProviderBinding {
            name: name.into(),
            provider: provider.into(),
            status: ConnectionStatus::Unverified,
            pricing,
            knowledge_cutoff: None,
            handle,
        }
    }

    pub fn with_knowledge_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.knowledge_cutoff = Some(cutoff);
        self
    }

    pub fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn pricing(&self) -> &PricingModel {
        &self.pricing
    }

    pub fn knowledge_cutoff(&self) -> Option<NaiveDate> {
        self.knowledge_cutoff
    }

    /// Sends a request to this binding's model. The request's model name is
    /// overwritten with the binding's own.
    pub async fn complete(&self, mut request: ModelRequest) -> Result<ModelResponse, ModelError> {
        request.model = self.name.clone();
        self.handle.complete(request).await
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("status", &self.status)
            .field("pricing", &self.pricing)
            .field("knowledge_cutoff", &self.knowledge_cutoff)
            .finish_non_exhaustive()
    }
}
