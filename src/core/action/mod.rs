//! Actions: typed transformation steps the planner chains together.
//!
//! - [`ActionDescriptor`](descriptor::ActionDescriptor) declares inputs, output and goal marking
//! - [`ActionLogic`] and [`AsyncActionLogic`] are the bodies an action runs
//! - [`ActionStore`](store::ActionStore) holds the declared actions of one agent

pub mod descriptor;
pub mod store;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::core::context::ActionContext;
use crate::core::{DomainType, DomainValue, TypeTag};
use crate::error::ActionError;
use descriptor::ActionDescriptor;

/// The synchronous body of an action.
///
/// Runs inline on the executor's control flow, so it should not block for long.
/// Model calls and parallel steps belong in an [`AsyncActionLogic`].
pub trait ActionLogic: Send + Sync + 'static {
    fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError>;
}

/// The asynchronous body of an action.
///
/// From the action's perspective a model call is a single awaited call that
/// yields a result or a failure.
#[async_trait]
pub trait AsyncActionLogic: Send + Sync + 'static {
    async fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError>;
}

/// Adapter turning a closure into an [`ActionLogic`].
pub struct FnLogic<F>(F);

impl<F> ActionLogic for FnLogic<F>
where
    F: Fn(&ActionInputs, &ActionContext<'_>) -> Result<DomainValue, ActionError>
        + Send
        + Sync
        + 'static,
{
    fn execute(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError> {
        (self.0)(inputs, ctx)
    }
}

/// The General Action Body Enum
#[derive(Clone)]
pub enum ActionBody {
    Sync(Arc<dyn ActionLogic>),
    Async(Arc<dyn AsyncActionLogic>),
}

impl ActionBody {
    pub async fn invoke(
        &self,
        inputs: &ActionInputs,
        ctx: &ActionContext<'_>,
    ) -> Result<DomainValue, ActionError> {
        match self {
            ActionBody::Sync(logic) => logic.execute(inputs, ctx),
            ActionBody::Async(logic) => logic.execute(inputs, ctx).await,
        }
    }
}

/// A declared action: its descriptor plus the body that implements it.
#[derive(Clone)]
pub struct Action {
    pub descriptor: ActionDescriptor,
    pub body: ActionBody,
}

impl Action {
    pub fn new<L: ActionLogic>(descriptor: ActionDescriptor, logic: L) -> Self {
        Action {
            descriptor,
            body: ActionBody::Sync(Arc::new(logic)),
        }
    }

    pub fn new_async<L: AsyncActionLogic>(descriptor: ActionDescriptor, logic: L) -> Self {
        Action {
            descriptor,
            body: ActionBody::Async(Arc::new(logic)),
        }
    }

    /// Creates a synchronous action from a closure.
    pub fn from_fn<F>(descriptor: ActionDescriptor, f: F) -> Self
    where
        F: Fn(&ActionInputs, &ActionContext<'_>) -> Result<DomainValue, ActionError>
            + Send
            + Sync
            + 'static,
    {
        Action::new(descriptor, FnLogic(f))
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.body {
            ActionBody::Sync(_) => "sync",
            ActionBody::Async(_) => "async",
        };
        f.debug_struct("Action")
            .field("descriptor", &self.descriptor)
            .field("body", &kind)
            .finish()
    }
}

/// The values gathered from the session for one invocation, in declared input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionInputs {
    values: Vec<(TypeTag, DomainValue)>,
}

impl ActionInputs {
    pub fn new(values: Vec<(TypeTag, DomainValue)>) -> Self {
        ActionInputs { values }
    }

    pub fn get(&self, tag: &TypeTag) -> Option<&DomainValue> {
        self.values.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    /// Deserializes the input registered under `tag`.
    pub fn decode<T: DeserializeOwned>(&self, tag: &TypeTag) -> Result<T, ActionError> {
        let value = self.get(tag).ok_or_else(|| {
            ActionError::failed(format!("'{}' is not a declared input of this action", tag))
        })?;
        serde_json::from_value(value.clone()).map_err(|source| ActionError::InvalidInput {
            tag: tag.clone(),
            source,
        })
    }

    /// Deserializes the input of domain type `T`.
    pub fn value<T: DomainType>(&self) -> Result<T, ActionError> {
        self.decode(&TypeTag::of::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeTag, &DomainValue)> {
        self.values.iter().map(|(t, v)| (t, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A JSON object keyed by tag, used for session records and telemetry.
    pub fn snapshot(&self) -> DomainValue {
        let map: serde_json::Map<String, DomainValue> = self
            .values
            .iter()
            .map(|(t, v)| (t.to_string(), v.clone()))
            .collect();
        DomainValue::Object(map)
    }
}

/// Serializes an action's result into a session value.
pub fn output<T: Serialize>(value: &T) -> Result<DomainValue, ActionError> {
    serde_json::to_value(value).map_err(ActionError::InvalidOutput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ideas {
        points: Vec<String>,
    }

    impl DomainType for Ideas {
        const TAG: &'static str = "Ideas";
    }

    fn inputs() -> ActionInputs {
        ActionInputs::new(vec![
            (TypeTag::new("Brief"), json!("walk in Paris")),
            (TypeTag::new("Ideas"), json!({"points": ["Louvre", "Orsay"]})),
        ])
    }

    #[test]
    fn test_inputs_lookup_and_decode() {
        let inputs = inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.get(&TypeTag::new("Brief")), Some(&json!("walk in Paris")));

        let brief: String = inputs.decode(&TypeTag::new("Brief")).unwrap();
        assert_eq!(brief, "walk in Paris");

        let ideas: Ideas = inputs.value().unwrap();
        assert_eq!(ideas.points, vec!["Louvre", "Orsay"]);
    }

    #[test]
    fn test_decode_undeclared_input_fails() {
        let result: Result<String, _> = inputs().decode(&TypeTag::new("Missing"));
        assert!(matches!(result, Err(ActionError::Failed(_))));
    }

    #[test]
    fn test_decode_wrong_shape_reports_tag() {
        let result: Result<u32, _> = inputs().decode(&TypeTag::new("Brief"));
        match result {
            Err(ActionError::InvalidInput { tag, .. }) => assert_eq!(tag, TypeTag::new("Brief")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_is_keyed_by_tag() {
        let snapshot = inputs().snapshot();
        assert_eq!(snapshot["Brief"], json!("walk in Paris"));
        assert_eq!(snapshot["Ideas"]["points"][1], json!("Orsay"));
    }

    #[test]
    fn test_output_serializes_domain_value() {
        let value = output(&Ideas {
            points: vec!["Louvre".to_string()],
        })
        .unwrap();
        assert_eq!(value, json!({"points": ["Louvre"]}));
    }
}
