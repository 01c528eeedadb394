use std::collections::HashMap;

use crate::core::action::descriptor::ActionDescriptor;
use crate::core::action::Action;
use crate::core::TypeTag;
use crate::error::PlanningError;

/// Holds the declared actions of one agent definition, in declaration order.
///
/// Declaration order is significant: the planner uses it to break ties between
/// actions producing the same type.
#[derive(Clone, Default, Debug)]
pub struct ActionStore {
    actions: Vec<Action>,
    by_name: HashMap<String, usize>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action. Names are unique within a store.
    pub fn register(&mut self, action: Action) -> Result<(), PlanningError> {
        let name = action.name().to_string();
        if self.by_name.contains_key(&name) {
            log::error!("Action '{}' is already registered, rejecting duplicate", name);
            return Err(PlanningError::DuplicateAction(name));
        }
        log::debug!("Registered action {}", action.descriptor);
        self.by_name.insert(name, self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn all_actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter().map(|a| &a.descriptor)
    }

    /// All actions whose output is `tag`, in declaration order.
    pub fn actions_producing(&self, tag: &TypeTag) -> Vec<&ActionDescriptor> {
        self.descriptors().filter(|d| &d.output == tag).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.by_name.get(name).map(|&i| &self.actions[i])
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
