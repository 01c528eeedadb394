//! Configuration-driven model registration.
//!
//! ```toml
//! default_model = "gemini-2.0-flash"
//!
//! [[models]]
//! name = "gemini-2.0-flash"
//! knowledge_cutoff = "2024-08-01"
//! input_price = 0.1
//! output_price = 0.4
//! ```
//!
//! Every model is connected and registered independently: one model failing
//! to connect is logged and recorded in the [`RegistrationReport`], the rest
//! still register.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{ConfigError, ModelError, RegistrationError};
use crate::model::ModelHandle;
use crate::model::binding::{ConnectionStatus, PricingModel, ProviderBinding};
use crate::model::registry::ProviderRegistry;

/// Properties of one configured model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProperties {
    pub name: String,
    /// Overrides the connector's provider label.
    #[serde(default)]
    pub provider: Option<String>,
    /// ISO date, e.g. `2024-08-01`.
    #[serde(default)]
    pub knowledge_cutoff: Option<String>,
    /// USD per 1M input tokens.
    #[serde(default)]
    pub input_price: f64,
    /// USD per 1M output tokens.
    #[serde(default)]
    pub output_price: f64,
}

impl ModelProperties {
    pub fn new(name: impl Into<String>) -> Self {
        ModelProperties {
            name: name.into(),
            provider: None,
            knowledge_cutoff: None,
            input_price: 0.0,
            output_price: 0.0,
        }
    }

    pub fn pricing(&self) -> PricingModel {
        if self.input_price == 0.0 && self.output_price == 0.0 {
            PricingModel::Free
        } else {
            PricingModel::per_token(self.input_price, self.output_price)
        }
    }

    fn parsed_cutoff(&self) -> Result<Option<NaiveDate>, RegistrationError> {
        self.knowledge_cutoff
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    RegistrationError::InvalidProperties {
                        name: self.name.clone(),
                        reason: format!("knowledge_cutoff '{}': {}", raw, e),
                    }
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub default_model: Option<String>,
    pub models: Vec<ModelProperties>,
}

impl ModelsConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }
}

/// Materializes a callable handle for one configured model of a provider family.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    /// Label recorded on every binding this connector produces.
    fn provider(&self) -> &str;

    /// Whether [`connect`](Self::connect) actually reaches the provider.
    fn verifies_connection(&self) -> bool {
        false
    }

    async fn connect(&self, model: &ModelProperties) -> Result<Arc<dyn ModelHandle>, ModelError>;
}

/// Outcome of registering one provider family's models.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<String>,
    pub failed: Vec<(String, RegistrationError)>,
}

impl RegistrationReport {
    /// At least one model registered and nothing failed.
    pub fn is_success(&self) -> bool {
        !self.registered.is_empty() && self.failed.is_empty()
    }
}

/// Connects and registers every configured model, isolating per-model failures.
pub async fn register_models(
    registry: &ProviderRegistry,
    config: &ModelsConfig,
    connector: &dyn ProviderConnector,
) -> RegistrationReport {
    let provider = connector.provider();
    let mut report = RegistrationReport::default();

    if config.models.is_empty() {
        log::warn!("No {} models configured", provider);
        return report;
    }

    let names: Vec<&str> = config.models.iter().map(|m| m.name.as_str()).collect();
    log::info!("Registering {} models: [{}]", provider, names.join(", "));

    for properties in &config.models {
        match register_one(registry, properties, connector).await {
            Ok(()) => {
                log::debug!("Successfully registered {} model '{}'", provider, properties.name);
                report.registered.push(properties.name.clone());
            }
            Err(e) => {
                log::error!("Failed to register {} model '{}': {}", provider, properties.name, e);
                report.failed.push((properties.name.clone(), e));
            }
        }
    }

    if let Some(default) = &config.default_model {
        if let Err(e) = registry.set_default(default) {
            log::error!("{}", e);
            report.failed.push((default.clone(), e));
        }
    }

    if report.registered.is_empty() {
        log::error!("{} connection: FAILURE!", provider);
    } else {
        log::info!(
            "{} connection: SUCCESS! ({} of {} models registered)",
            provider,
            report.registered.len(),
            config.models.len()
        );
    }

    report
}

async fn register_one(
    registry: &ProviderRegistry,
    properties: &ModelProperties,
    connector: &dyn ProviderConnector,
) -> Result<(), RegistrationError> {
    let cutoff = properties.parsed_cutoff()?;
    let handle = connector
        .connect(properties)
        .await
        .map_err(|source| RegistrationError::Connection {
            name: properties.name.clone(),
            source,
        })?;

    let provider = properties
        .provider
        .clone()
        .unwrap_or_else(|| connector.provider().to_string());
    let status = if connector.verifies_connection() {
        ConnectionStatus::Connected
    } else {
        ConnectionStatus::Unverified
    };

    let mut binding =
        ProviderBinding::new(&properties.name, provider, properties.pricing(), handle).with_status(status);
    if let Some(cutoff) = cutoff {
        binding = binding.with_knowledge_cutoff(cutoff);
    }
    registry.register_provider(binding)
}
