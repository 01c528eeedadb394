use std::collections::HashSet;

use crate::core::TypeTag;
use crate::core::action::store::ActionStore;
use crate::core::agent::Goal;

/// Represents an issue found while validating an agent's actions and goals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A hard error: some goal can never be planned.
    Error(String),
    /// A warning: planning may fail depending on the initial input.
    Warning(String),
}

/// The result of an agent validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Error(msg.into()));
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.issues.push(ValidationIssue::Warning(msg.into()));
    }

    pub fn is_safe(&self) -> bool {
        !self.issues.iter().any(|i| matches!(i, ValidationIssue::Error(_)))
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| matches!(i, ValidationIssue::Warning(_)))
    }

    pub fn log_summary(&self, agent: &str) {
        if self.is_safe() && !self.has_warnings() {
            log::info!("Agent '{}' validation passed: every goal has a producer", agent);
            return;
        }

        for issue in &self.issues {
            match issue {
                ValidationIssue::Error(msg) => log::error!("Agent '{}': {}", agent, msg),
                ValidationIssue::Warning(msg) => log::warn!("Agent '{}': {}", agent, msg),
            }
        }
    }
}

/// Statically checks the data flow between an agent's actions.
///
/// Types no action produces can only come from the initial input, so an
/// action requiring two of them can never run.
pub fn validate(store: &ActionStore, goals: &[Goal]) -> ValidationResult {
    let mut result = ValidationResult::new();
    let produced: HashSet<&TypeTag> = store.descriptors().map(|d| &d.output).collect();

    for goal in goals {
        let producers = store.actions_producing(&goal.output);
        if producers.is_empty() {
            result.add_error(format!("goal '{}' has no producing action", goal.output));
            continue;
        }
        let marked: Vec<&str> = producers
            .iter()
            .filter(|d| d.achieves_goal)
            .map(|d| d.name.as_str())
            .collect();
        if marked.len() > 1 {
            result.add_warning(format!(
                "goal '{}' is achieved by several actions [{}]; planning will report it as ambiguous when more than one is viable",
                goal.output,
                marked.join(", ")
            ));
        }
    }

    for descriptor in store.descriptors() {
        let external: Vec<&TypeTag> = descriptor
            .inputs
            .iter()
            .filter(|tag| !produced.contains(tag))
            .collect();
        if external.len() > 1 {
            let names: Vec<String> = external.iter().map(|t| t.to_string()).collect();
            result.add_error(format!(
                "action '{}' requires [{}], none of which any action produces; only one can be the initial input",
                descriptor.name,
                names.join(", ")
            ));
        } else if let Some(tag) = external.first() {
            result.add_warning(format!(
                "action '{}' can only run when '{}' is the initial input",
                descriptor.name, tag
            ));
        }
        if descriptor.requires(&descriptor.output) {
            result.add_warning(format!(
                "action '{}' consumes its own output type '{}'",
                descriptor.name, descriptor.output
            ));
        }
    }

    result
}
