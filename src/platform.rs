use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::TypedValue;
use crate::core::agent::Agent;
use crate::core::options::RunOptions;
use crate::core::planner::Plan;
use crate::core::process::{ProcessExecutor, ProcessOutcome};
use crate::core::telemetry::Telemetry;
use crate::error::RunError;
use crate::model::registry::ProviderRegistry;
use crate::model::selector::ModelSelector;

/// Hosts deployed agents and the provider registry they share.
///
/// Runs borrow the platform immutably, so one platform can serve many
/// concurrent runs.
pub struct AgentPlatform {
    agents: BTreeMap<String, Agent>,
    selector: ModelSelector,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl AgentPlatform {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        AgentPlatform {
            agents: BTreeMap::new(),
            selector: ModelSelector::new(registry),
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Deploys an agent, replacing any agent of the same name.
    pub fn deploy(&mut self, agent: Agent) {
        agent.validate().log_summary(agent.name());
        if self.agents.contains_key(agent.name()) {
            log::warn!("Replacing deployed agent '{}'", agent.name());
        } else {
            log::info!(
                "Deployed agent '{}' with {} actions and {} goals",
                agent.name(),
                agent.actions().len(),
                agent.goals().len()
            );
        }
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.selector.registry()
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    /// Plans a run without executing it.
    pub fn plan(&self, agent_name: &str, input: &TypedValue, options: &RunOptions) -> Result<Plan, RunError> {
        let agent = self
            .agents
            .get(agent_name)
            .ok_or_else(|| RunError::UnknownAgent(agent_name.to_string()))?;
        Ok(agent.plan(&input.tag, options.goal.as_ref())?)
    }

    /// Plans and executes one run of `agent_name` from `input`.
    ///
    /// The error identifies the phase that failed: planning, provider
    /// resolution or action execution.
    pub async fn run_agent(
        &self,
        agent_name: &str,
        input: TypedValue,
        options: RunOptions,
    ) -> Result<ProcessOutcome, RunError> {
        let agent = self
            .agents
            .get(agent_name)
            .ok_or_else(|| RunError::UnknownAgent(agent_name.to_string()))?;

        let plan = agent.plan(&input.tag, options.goal.as_ref())?;

        let mut executor = ProcessExecutor::new(agent.actions(), &self.selector);
        if let Some(telemetry) = &self.telemetry {
            executor = executor.with_telemetry(Arc::clone(telemetry));
        }

        let outcome = executor.run(plan, input, &options).await.map_err(|e| {
            let err = RunError::from(e);
            log::error!("Agent '{}' failed during {:?}: {}", agent_name, err.phase(), err);
            err
        })?;
        Ok(outcome)
    }
}
