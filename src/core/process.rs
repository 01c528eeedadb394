use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::core::action::descriptor::ActionDescriptor;
use crate::core::action::store::ActionStore;
use crate::core::action::ActionInputs;
use crate::core::context::ActionContext;
use crate::core::options::RunOptions;
use crate::core::planner::Plan;
use crate::core::session::{Session, SessionRecord};
use crate::core::telemetry::{Telemetry, TraceEntry};
use crate::core::{DomainType, DomainValue, TypedValue};
use crate::error::{ActionError, ExecutionError};
use crate::model::selector::ModelSelector;

/// What a completed run leaves behind.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub plan: Plan,
    /// The goal value.
    pub output: DomainValue,
    /// The final session, including the log of every executed action.
    pub session: Session,
}

impl ProcessOutcome {
    /// Deserializes the goal value.
    pub fn output_as<T: DomainType>(&self) -> Result<T, ActionError> {
        TypedValue::new(self.plan.goal().clone(), self.output.clone()).decode()
    }
}

/// Runs a plan step by step against a fresh session.
///
/// Actions execute strictly in plan order; the session is written only here,
/// between actions. Any failure aborts the run without retry.
pub struct ProcessExecutor<'a> {
    store: &'a ActionStore,
    selector: &'a ModelSelector,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl<'a> ProcessExecutor<'a> {
    pub fn new(store: &'a ActionStore, selector: &'a ModelSelector) -> Self {
        ProcessExecutor {
            store,
            selector,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub async fn run(
        &self,
        plan: Plan,
        initial: TypedValue,
        options: &RunOptions,
    ) -> Result<ProcessOutcome, ExecutionError> {
        if plan.is_empty() {
            return Err(ExecutionError::EmptyPlan);
        }

        let mut session = Session::seeded(&initial);
        log::info!("Session {}: running {}", session.id(), plan);

        let mut output = DomainValue::Null;
        for step in plan.steps() {
            output = self.run_step(step, &mut session, options).await?;
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.flush();
        }
        log::info!(
            "Session {}: goal '{}' reached after {} actions",
            session.id(),
            plan.goal(),
            plan.len()
        );

        Ok(ProcessOutcome {
            plan,
            output,
            session,
        })
    }

    async fn run_step(
        &self,
        step: &ActionDescriptor,
        session: &mut Session,
        options: &RunOptions,
    ) -> Result<DomainValue, ExecutionError> {
        if options.cancellation.is_cancelled() {
            log::warn!("Session {}: cancelled before '{}'", session.id(), step.name);
            return Err(ExecutionError::Cancelled {
                action: step.name.clone(),
            });
        }

        if let Some(group) = step
            .tool_groups
            .iter()
            .find(|g| !options.tool_permissions.permits(g))
        {
            return Err(ExecutionError::ToolGroupDenied {
                action: step.name.clone(),
                group: group.clone(),
            });
        }

        let action = self
            .store
            .get(&step.name)
            .ok_or_else(|| ExecutionError::ActionInvocation {
                action: step.name.clone(),
                source: ActionError::failed("action is not registered with this agent"),
            })?;

        let inputs = gather_inputs(step, session)?;
        log::debug!("Session {}: invoking '{}'", session.id(), step);

        let started_at = Utc::now();
        let clock = Instant::now();
        let result = {
            let ctx = ActionContext::new(session, self.selector, options, &action.descriptor);
            tokio::select! {
                _ = options.cancellation.cancelled() => Err(ActionError::Cancelled),
                result = action.body.invoke(&inputs, &ctx) => result,
            }
        };
        let elapsed_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.trace(session, step, &inputs, &result, elapsed_ms);

        let value = match result {
            Ok(value) => value,
            Err(ActionError::Cancelled) => {
                log::warn!("Session {}: '{}' was cancelled", session.id(), step.name);
                return Err(ExecutionError::Cancelled {
                    action: step.name.clone(),
                });
            }
            Err(source) => {
                log::error!("Session {}: '{}' failed: {}", session.id(), step.name, source);
                return Err(ExecutionError::ActionInvocation {
                    action: step.name.clone(),
                    source,
                });
            }
        };

        if options.verbosity.debug {
            log::info!("Session {}: '{}' produced {} = {}", session.id(), step.name, step.output, value);
        }
        session.bind(step.output.clone(), value.clone());
        session.record(SessionRecord {
            action: step.name.clone(),
            inputs: inputs.snapshot(),
            output_tag: step.output.clone(),
            output: value.clone(),
            started_at,
            elapsed_ms,
        });

        Ok(value)
    }

    fn trace(
        &self,
        session: &Session,
        step: &ActionDescriptor,
        inputs: &ActionInputs,
        result: &Result<DomainValue, ActionError>,
        elapsed_ms: u64,
    ) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        let (output, error) = match result {
            Ok(value) => (Some(value.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        telemetry.record(TraceEntry {
            timestamp: Utc::now(),
            run_id: session.id().to_string(),
            action: step.name.clone(),
            inputs: inputs.snapshot(),
            output,
            error,
            elapsed_ms,
            metadata: HashMap::from([("output_type".to_string(), step.output.to_string())]),
        });
    }
}

fn gather_inputs(step: &ActionDescriptor, session: &Session) -> Result<ActionInputs, ExecutionError> {
    step.inputs
        .iter()
        .map(|tag| {
            session
                .get(tag)
                .map(|value| (tag.clone(), value.clone()))
                .ok_or_else(|| ExecutionError::MissingInput {
                    action: step.name.clone(),
                    tag: tag.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ActionInputs::new)
}
