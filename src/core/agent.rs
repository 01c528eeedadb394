use crate::core::TypeTag;
use crate::core::action::Action;
use crate::core::action::store::ActionStore;
use crate::core::planner::{self, Plan};
use crate::core::validation::{self, ValidationResult};
use crate::error::PlanningError;

/// A target output type plus what reaching it means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub output: TypeTag,
    pub description: String,
}

impl Goal {
    pub fn new(output: impl Into<TypeTag>, description: impl Into<String>) -> Self {
        Goal {
            output: output.into(),
            description: description.into(),
        }
    }
}

/// A named pool of actions and the goals they can reach.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    description: String,
    store: ActionStore,
    goals: Vec<Goal>,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn actions(&self) -> &ActionStore {
        &self.store
    }

    /// Declared goals, in declaration order.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal_for(&self, output: &TypeTag) -> Option<&Goal> {
        self.goals.iter().find(|g| &g.output == output)
    }

    pub fn validate(&self) -> ValidationResult {
        validation::validate(&self.store, &self.goals)
    }

    /// Plans towards `goal`, or towards the first declared goal when none is given.
    pub fn plan(&self, initial: &TypeTag, goal: Option<&TypeTag>) -> Result<Plan, PlanningError> {
        let goal = match goal {
            Some(tag) => self.goal_for(tag).ok_or_else(|| PlanningError::UnknownGoal {
                agent: self.name.clone(),
                goal: tag.clone(),
            })?,
            None => self
                .goals
                .first()
                .ok_or_else(|| PlanningError::NoGoal(self.name.clone()))?,
        };
        log::debug!("Agent '{}' planning for goal '{}': {}", self.name, goal.output, goal.description);
        planner::plan(initial, &goal.output, &self.store)
    }
}

/// Builds an [`Agent`] by explicit registration.
///
/// Every goal-achieving action declares a goal for its output type; further
/// goals can be declared with [`goal`](AgentBuilder::goal). Registration
/// errors are deferred to [`build`](AgentBuilder::build).
pub struct AgentBuilder {
    name: String,
    description: String,
    store: ActionStore,
    goals: Vec<Goal>,
    error: Option<PlanningError>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        AgentBuilder {
            name: name.into(),
            description: String::new(),
            store: ActionStore::new(),
            goals: Vec::new(),
            error: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        if self.error.is_some() {
            return self;
        }
        let derived = action.descriptor.achieves_goal.then(|| {
            let description = action
                .descriptor
                .goal_description
                .clone()
                .unwrap_or_else(|| format!("produce {}", action.descriptor.output));
            Goal::new(action.descriptor.output.clone(), description)
        });
        match self.store.register(action) {
            Ok(()) => {
                if let Some(goal) = derived {
                    self.push_goal(goal);
                }
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn goal(mut self, goal: Goal) -> Self {
        self.push_goal(goal);
        self
    }

    fn push_goal(&mut self, goal: Goal) {
        if !self.goals.iter().any(|g| g.output == goal.output) {
            self.goals.push(goal);
        }
    }

    pub fn build(self) -> Result<Agent, PlanningError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.goals.is_empty() {
            return Err(PlanningError::NoGoal(self.name));
        }
        Ok(Agent {
            name: self.name,
            description: self.description,
            store: self.store,
            goals: self.goals,
        })
    }
}
