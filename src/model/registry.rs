use std::sync::{PoisonError, RwLock};

use crate::error::RegistrationError;
use crate::model::binding::ProviderBinding;

/// A consistent view of the registry taken under one read lock.
#[derive(Debug, Default, Clone)]
pub(crate) struct RegistryState {
    pub(crate) bindings: Vec<ProviderBinding>,
    default: Option<String>,
}

impl RegistryState {
    /// The configured default, falling back to the first registered binding.
    pub(crate) fn default_binding(&self) -> Option<&ProviderBinding> {
        self.default
            .as_deref()
            .and_then(|name| self.bindings.iter().find(|b| b.name() == name))
            .or_else(|| self.bindings.first())
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.name().to_string()).collect()
    }
}

/// Thread-safe store of every provider binding known to a process.
///
/// Written once at startup, read concurrently by every run afterwards.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding; names are unique across all providers.
    pub fn register_provider(&self, binding: ProviderBinding) -> Result<(), RegistrationError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.bindings.iter().any(|b| b.name() == binding.name()) {
            log::error!("Provider '{}' is already registered", binding.name());
            return Err(RegistrationError::DuplicateProvider(binding.name().to_string()));
        }
        log::debug!(
            "Registered provider '{}' ({})",
            binding.name(),
            binding.provider()
        );
        state.bindings.push(binding);
        Ok(())
    }

    /// Marks an already registered binding as the default model.
    pub fn set_default(&self, name: &str) -> Result<(), RegistrationError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.bindings.iter().any(|b| b.name() == name) {
            return Err(RegistrationError::UnknownDefault(name.to_string()));
        }
        state.default = Some(name.to_string());
        Ok(())
    }

    /// All bindings in registration order.
    pub fn all_providers(&self) -> Vec<ProviderBinding> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bindings
            .clone()
    }

    pub fn provider_by_name(&self, name: &str) -> Option<ProviderBinding> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bindings
            .iter()
            .find(|b| b.name() == name)
            .cloned()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).names()
    }

    /// The configured default, falling back to the first registered binding.
    pub fn default_provider(&self) -> Option<ProviderBinding> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_binding()
            .cloned()
    }

    pub(crate) fn snapshot(&self) -> RegistryState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .bindings
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::binding::PricingModel;
    use crate::model::{ModelHandle, ModelRequest, ModelResponse};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Silent;

    #[async_trait]
    impl ModelHandle for Silent {
        async fn complete(&self, _request: ModelRequest) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse::text(""))
        }
    }

    fn binding(name: &str) -> ProviderBinding {
        ProviderBinding::new(name, "Test", PricingModel::Free, Arc::new(Silent))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        registry.register_provider(binding("x-small")).unwrap();
        registry.register_provider(binding("x-large")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.provider_names(), vec!["x-small", "x-large"]);
        assert_eq!(registry.provider_by_name("x-large").unwrap().name(), "x-large");
        assert!(registry.provider_by_name("x-medium").is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let registry = ProviderRegistry::new();
        registry.register_provider(binding("x-small")).unwrap();
        let result = registry.register_provider(binding("x-small"));

        assert!(matches!(result, Err(RegistrationError::DuplicateProvider(name)) if name == "x-small"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_provider() {
        let registry = ProviderRegistry::new();
        assert!(registry.default_provider().is_none());

        registry.register_provider(binding("x-small")).unwrap();
        registry.register_provider(binding("x-large")).unwrap();
        assert_eq!(registry.default_provider().unwrap().name(), "x-small");

        registry.set_default("x-large").unwrap();
        assert_eq!(registry.default_provider().unwrap().name(), "x-large");

        assert!(matches!(
            registry.set_default("missing"),
            Err(RegistrationError::UnknownDefault(_))
        ));
    }

    #[test]
    fn test_concurrent_reads() {
        let registry = Arc::new(ProviderRegistry::new());
        registry.register_provider(binding("x-small")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.provider_by_name("x-small").is_some())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
