use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

use crate::core::{ToolGroup, TypeTag};
use crate::error::ConfigError;

pub const DEFAULT_CONCURRENCY_LIMIT: usize = 50;

/// Controls which intermediate prompts and results are surfaced in the logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Verbosity {
    pub show_prompts: bool,
    pub show_llm_responses: bool,
    /// Log every session write and planning decision at info level.
    pub debug: bool,
}

impl Verbosity {
    pub fn verbose() -> Self {
        Verbosity {
            show_prompts: true,
            show_llm_responses: true,
            debug: false,
        }
    }
}

/// Which tool groups actions of a run may use. `None` permits every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolPermissions(Option<BTreeSet<ToolGroup>>);

impl ToolPermissions {
    pub fn all() -> Self {
        ToolPermissions(None)
    }

    pub fn only<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<ToolGroup>,
    {
        ToolPermissions(Some(groups.into_iter().map(Into::into).collect()))
    }

    pub fn none() -> Self {
        ToolPermissions(Some(BTreeSet::new()))
    }

    pub fn permits(&self, group: &ToolGroup) -> bool {
        match &self.0 {
            None => true,
            Some(allowed) => allowed.contains(group),
        }
    }
}

/// Options for a single agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub verbosity: Verbosity,
    /// Maximum number of in-flight calls inside one `parallel_map`.
    pub concurrency_limit: usize,
    pub tool_permissions: ToolPermissions,
    /// The goal type to plan for; defaults to the agent's first declared goal.
    pub goal: Option<TypeTag>,
    #[serde(skip, default = "CancellationToken::new")]
    pub cancellation: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            verbosity: Verbosity::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            tool_permissions: ToolPermissions::all(),
            goal: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from TOML, e.g. `concurrency_limit = 4`.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Concurrency limit must be greater than 0");
        self.concurrency_limit = limit;
        self
    }

    pub fn with_tool_permissions(mut self, permissions: ToolPermissions) -> Self {
        self.tool_permissions = permissions;
        self
    }

    pub fn with_goal(mut self, goal: impl Into<TypeTag>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    /// Ties the run to an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}
