//! Concrete provider connectors, compiled with the `llm` feature.
//!
//! Each connector implements [`ProviderConnector`](crate::model::config::ProviderConnector)
//! and is handed to [`register_models`](crate::model::config::register_models).

pub mod ollama;

pub use ollama::{OllamaConfig, OllamaConnector, OllamaHandle};
