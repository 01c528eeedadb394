//! Error types for every phase of an agent run.
//!
//! Planning errors are reported before any action executes. Execution errors
//! abort the run. Registration errors are per provider and never fatal.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::{ToolGroup, TypeTag};
use crate::model::criteria::ModelSelectionCriteria;

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("goal '{goal}' is unreachable: no action can produce '{missing}' from the available inputs")]
    UnreachableGoal { goal: TypeTag, missing: TypeTag },

    #[error("goal '{goal}' is ambiguous: actions [{}] all produce it", .candidates.join(", "))]
    AmbiguousGoal { goal: TypeTag, candidates: Vec<String> },

    #[error("agent '{agent}' declares no goal producing '{goal}'")]
    UnknownGoal { agent: String, goal: TypeTag },

    #[error("agent '{0}' declares no goals")]
    NoGoal(String),
}

#[derive(Debug, Clone, Error)]
pub enum SelectionError {
    #[error("no provider matches {criteria}; available providers: [{}]", .available.join(", "))]
    NoMatchingProvider {
        criteria: ModelSelectionCriteria,
        available: Vec<String>,
    },

    #[error("no providers registered (requested {criteria})")]
    NoProvidersRegistered { criteria: ModelSelectionCriteria },
}

/// Failures raised by a model handle while serving a request.
#[derive(Debug, Error)]
pub enum ModelError {
    #[cfg(feature = "llm")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("provider '{0}' is already registered")]
    DuplicateProvider(String),

    #[error("failed to connect model '{name}': {source}")]
    Connection {
        name: String,
        #[source]
        source: ModelError,
    },

    #[error("invalid properties for model '{name}': {reason}")]
    InvalidProperties { name: String, reason: String },

    #[error("default provider '{0}' is not registered")]
    UnknownDefault(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Anything an action body can fail with.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("input '{tag}' could not be read: {source}")]
    InvalidInput {
        tag: TypeTag,
        #[source]
        source: serde_json::Error,
    },

    #[error("output could not be serialized: {0}")]
    InvalidOutput(#[source] serde_json::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ActionError::Failed(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The plan handed to the executor does not line up with the session.
    #[error("action '{action}' is missing input '{tag}': the plan is inconsistent")]
    MissingInput { action: String, tag: TypeTag },

    #[error("action '{action}' failed: {source}")]
    ActionInvocation {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("action '{action}' requests tool group '{group}' which this run does not permit")]
    ToolGroupDenied { action: String, group: ToolGroup },

    #[error("run cancelled at action '{action}'")]
    Cancelled { action: String },

    #[error("plan contains no actions")]
    EmptyPlan,
}

/// The phase of a run that produced a [`RunError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Planning,
    ProviderResolution,
    Execution,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no agent named '{0}'")]
    UnknownAgent(String),

    #[error("planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("provider resolution failed in action '{action}': {source}")]
    ProviderResolution {
        action: String,
        #[source]
        source: SelectionError,
    },

    #[error("execution failed: {0}")]
    Execution(ExecutionError),
}

impl RunError {
    pub fn phase(&self) -> RunPhase {
        match self {
            RunError::UnknownAgent(_) | RunError::Planning(_) => RunPhase::Planning,
            RunError::ProviderResolution { .. } => RunPhase::ProviderResolution,
            RunError::Execution(_) => RunPhase::Execution,
        }
    }
}

impl From<ExecutionError> for RunError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::ActionInvocation {
                action,
                source: ActionError::Selection(source),
            } => RunError::ProviderResolution { action, source },
            other => RunError::Execution(other),
        }
    }
}
