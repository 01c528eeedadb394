//! # Telos
//!
//! Goal-directed agent planning for Rust: declare typed actions and a goal,
//! and let the planner work out the order that gets you there.
//!
//! ## Features
//!
//! - **Planned, not wired**: actions declare the types they consume and produce; the planner chains them
//! - **Typed session**: every run keeps a blackboard of the latest value per type, plus an inspectable log
//! - **Bounded parallelism**: `parallel_map` fans out inside an action and keeps results in input order
//! - **Model resolution**: pick an LLM by name, by capability or by default from a shared registry
//! - **Optional LLM connectors**: an Ollama connector behind the `llm` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use std::sync::Arc;
//! use telos::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let agent = Agent::builder("greeter")
//!     .action(Action::from_fn(
//!         ActionDescriptor::parse("greet", "Name -> Greeting")?.achieves_goal("greet someone"),
//!         |inputs, _ctx| {
//!             let name: String = inputs.decode(&TypeTag::new("Name"))?;
//!             Ok(json!(format!("Hello, {}!", name)))
//!         },
//!     ))
//!     .build()?;
//!
//! let mut platform = AgentPlatform::new(Arc::new(ProviderRegistry::new()));
//! platform.deploy(agent);
//!
//! let outcome = platform
//!     .run_agent("greeter", TypedValue::new("Name", json!("Ada")), RunOptions::default())
//!     .await?;
//! assert_eq!(outcome.output, json!("Hello, Ada!"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: actions, planner, session, process executor and parallel map
//! - [`model`]: provider bindings, registry, selection criteria and config-driven registration
//! - [`platform`]: deployed agents and the `run_agent` entry point
//! - [`error`]: error types for every phase of a run
//! - [`prelude`]: commonly used types (import with `use telos::prelude::*`)

// ============================================================================
// Modules
// ============================================================================

pub mod core;
pub mod error;
pub mod model;
pub mod platform;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Core types
pub use crate::core::{DomainType, DomainValue, ToolGroup, TypeTag, TypedValue};

// Actions and agents
pub use crate::core::action::descriptor::ActionDescriptor;
pub use crate::core::action::store::ActionStore;
pub use crate::core::action::{Action, ActionInputs, ActionLogic, AsyncActionLogic, output};
pub use crate::core::agent::{Agent, AgentBuilder, Goal};
pub use crate::core::validation::{ValidationIssue, ValidationResult};

// Planning and execution
pub use crate::core::context::ActionContext;
pub use crate::core::options::{DEFAULT_CONCURRENCY_LIMIT, RunOptions, ToolPermissions, Verbosity};
pub use crate::core::parallel::parallel_map;
pub use crate::core::planner::{Plan, plan};
pub use crate::core::process::{ProcessExecutor, ProcessOutcome};
pub use crate::core::session::{Session, SessionRecord};
pub use crate::core::telemetry::{MemoryTelemetry, Telemetry, TraceEntry};

// Model resolution
pub use crate::model::binding::{ConnectionStatus, PricingModel, ProviderBinding};
pub use crate::model::config::{ModelProperties, ModelsConfig, ProviderConnector, RegistrationReport, register_models};
pub use crate::model::criteria::{Capability, ModelSelectionCriteria};
pub use crate::model::registry::ProviderRegistry;
pub use crate::model::selector::ModelSelector;
pub use crate::model::{LlmOptions, ModelHandle, ModelRequest, ModelResponse, Usage};

// Errors
pub use crate::error::{
    ActionError, ConfigError, ExecutionError, ModelError, PlanningError, RegistrationError, RunError,
    RunPhase, SelectionError,
};

pub use crate::platform::AgentPlatform;

// ============================================================================
// Prelude
// ============================================================================

/// The main prelude: everything needed to declare, deploy and run an agent.
///
/// # Example
/// ```rust
/// use telos::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Actions
        Action,
        ActionContext,
        ActionDescriptor,
        ActionError,
        ActionInputs,
        ActionLogic,
        // Agents
        Agent,
        AgentPlatform,
        AsyncActionLogic,
        // Core
        DomainType,
        DomainValue,
        Goal,
        // Models
        LlmOptions,
        ModelSelectionCriteria,
        ProviderRegistry,
        // Runs
        RunError,
        RunOptions,
        ToolPermissions,
        TypeTag,
        TypedValue,
        Verbosity,
    };
}

// ============================================================================
// LLM Feature
// ============================================================================

#[cfg(feature = "llm")]
pub mod llm;

#[cfg(feature = "llm")]
pub use llm::{OllamaConfig, OllamaConnector};

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
