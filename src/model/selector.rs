use std::sync::Arc;

use crate::error::SelectionError;
use crate::model::binding::ProviderBinding;
use crate::model::criteria::ModelSelectionCriteria;
use crate::model::registry::ProviderRegistry;

/// Resolves selection criteria against a shared registry.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    registry: Arc<ProviderRegistry>,
}

impl ModelSelector {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        ModelSelector { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Returns exactly one binding, or an error naming the criteria and what is available.
    ///
    /// Capability matches resolve to the first qualifying binding in registration order.
    /// Only a default request on an empty registry is `NoProvidersRegistered`; a name
    /// or capability that matches nothing is `NoMatchingProvider`, even with no providers.
    pub fn select(&self, criteria: &ModelSelectionCriteria) -> Result<ProviderBinding, SelectionError> {
        let snapshot = self.registry.snapshot();

        let selected = match criteria {
            ModelSelectionCriteria::ByName(name) => {
                snapshot.bindings.iter().find(|binding| binding.name() == name)
            }
            ModelSelectionCriteria::ByCapability(requirements) => snapshot
                .bindings
                .iter()
                .find(|binding| requirements.iter().all(|r| r.matches(binding))),
            ModelSelectionCriteria::Default => match snapshot.default_binding() {
                Some(binding) => Some(binding),
                None => {
                    return Err(SelectionError::NoProvidersRegistered {
                        criteria: criteria.clone(),
                    });
                }
            },
        };

        match selected {
            Some(binding) => {
                log::debug!("Selected model '{}' for {}", binding.name(), criteria);
                Ok(binding.clone())
            }
            None => Err(SelectionError::NoMatchingProvider {
                criteria: criteria.clone(),
                available: snapshot.names(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::binding::PricingModel;
    use crate::model::criteria::Capability;
    use crate::model::{ModelHandle, ModelRequest, ModelResponse};
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl ModelHandle for Silent {
        async fn complete(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse::text(""))
        }
    }

    fn selector() -> ModelSelector {
        let registry = ProviderRegistry::new();
        registry
            .register_provider(ProviderBinding::new(
                "x-small",
                "Local",
                PricingModel::Free,
                Arc::new(Silent),
            ))
            .unwrap();
        registry
            .register_provider(ProviderBinding::new(
                "x-large",
                "Cloud",
                PricingModel::per_token(3.0, 15.0),
                Arc::new(Silent),
            ))
            .unwrap();
        ModelSelector::new(Arc::new(registry))
    }

    #[test]
    fn test_select_by_name() {
        let selector = selector();
        let binding = selector.select(&ModelSelectionCriteria::by_name("x-large")).unwrap();
        assert_eq!(binding.name(), "x-large");
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err = selector()
            .select(&ModelSelectionCriteria::by_name("x-medium"))
            .unwrap_err();
        match &err {
            SelectionError::NoMatchingProvider { available, .. } => {
                assert_eq!(available, &vec!["x-small".to_string(), "x-large".to_string()]);
            }
            other => panic!("Expected NoMatchingProvider, got {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains("x-medium"));
        assert!(message.contains("x-small, x-large"));
    }

    #[test]
    fn test_select_by_capability_takes_first_match() {
        let selector = selector();
        let cloud = selector
            .select(&ModelSelectionCriteria::by_capability([Capability::Provider(
                "cloud".to_string(),
            )]))
            .unwrap();
        assert_eq!(cloud.name(), "x-large");

        let cheap = selector
            .select(&ModelSelectionCriteria::by_capability([Capability::MaxInputPrice(100.0)]))
            .unwrap();
        assert_eq!(cheap.name(), "x-small");
    }

    #[test]
    fn test_default_selection() {
        let selector = selector();
        assert_eq!(
            selector.select(&ModelSelectionCriteria::Default).unwrap().name(),
            "x-small"
        );
    }

    #[test]
    fn test_empty_registry() {
        let selector = ModelSelector::new(Arc::new(ProviderRegistry::new()));
        assert!(matches!(
            selector.select(&ModelSelectionCriteria::Default),
            Err(SelectionError::NoProvidersRegistered { .. })
        ));
    }

    #[test]
    fn test_empty_registry_by_name_is_no_match() {
        let selector = ModelSelector::new(Arc::new(ProviderRegistry::new()));
        match selector.select(&ModelSelectionCriteria::by_name("x-medium")) {
            Err(SelectionError::NoMatchingProvider { criteria, available }) => {
                assert_eq!(criteria, ModelSelectionCriteria::by_name("x-medium"));
                assert!(available.is_empty());
            }
            other => panic!("Expected NoMatchingProvider, got {:?}", other),
        }
        assert!(matches!(
            selector.select(&ModelSelectionCriteria::by_capability([Capability::MaxInputPrice(1.0)])),
            Err(SelectionError::NoMatchingProvider { .. })
        ));
    }

    #[test]
    fn test_configured_default_wins_over_first_registered() {
        let selector = selector();
        selector.registry().set_default("x-large").unwrap();
        assert_eq!(
            selector.select(&ModelSelectionCriteria::Default).unwrap().name(),
            "x-large"
        );
    }
}
