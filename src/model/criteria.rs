use chrono::NaiveDate;
use std::fmt;

use crate::model::binding::ProviderBinding;

/// A single requirement a binding must meet.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    Provider(String),
    /// Knowledge cutoff on or after the given date.
    KnowledgeCutoffAfter(NaiveDate),
    /// USD per 1M input tokens at most.
    MaxInputPrice(f64),
    /// USD per 1M output tokens at most.
    MaxOutputPrice(f64),
}

impl Capability {
    pub fn matches(&self, binding: &ProviderBinding) -> bool {
        match self {
            Capability::Provider(provider) => binding.provider().eq_ignore_ascii_case(provider),
            Capability::KnowledgeCutoffAfter(date) => {
                binding.knowledge_cutoff().is_some_and(|cutoff| cutoff >= *date)
            }
            Capability::MaxInputPrice(max) => binding.pricing().input_price() <= *max,
            Capability::MaxOutputPrice(max) => binding.pricing().output_price() <= *max,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Provider(p) => write!(f, "provider={}", p),
            Capability::KnowledgeCutoffAfter(d) => write!(f, "knowledge_cutoff>={}", d),
            Capability::MaxInputPrice(p) => write!(f, "input_price<={}", p),
            Capability::MaxOutputPrice(p) => write!(f, "output_price<={}", p),
        }
    }
}

/// How to pick one binding from the registry. Constructed per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSelectionCriteria {
    /// Exactly the binding with this name.
    ByName(String),
    /// The first registered binding meeting every requirement.
    ByCapability(Vec<Capability>),
    /// The configured default, or the first registered binding.
    Default,
}

impl ModelSelectionCriteria {
    pub fn by_name(name: impl Into<String>) -> Self {
        ModelSelectionCriteria::ByName(name.into())
    }

    pub fn by_capability(requirements: impl IntoIterator<Item = Capability>) -> Self {
        ModelSelectionCriteria::ByCapability(requirements.into_iter().collect())
    }
}

impl fmt::Display for ModelSelectionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelectionCriteria::ByName(name) => write!(f, "name '{}'", name),
            ModelSelectionCriteria::ByCapability(requirements) => {
                let parts: Vec<String> = requirements.iter().map(ToString::to_string).collect();
                write!(f, "capabilities [{}]", parts.join(", "))
            }
            ModelSelectionCriteria::Default => f.write_str("the default model"),
        }
    }
}
