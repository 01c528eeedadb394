use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{DomainType, DomainValue, TypeTag, TypedValue};
use crate::error::ActionError;

/// One executed action, as recorded in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub action: String,
    /// The inputs the action was invoked with, keyed by tag.
    pub inputs: DomainValue,
    pub output_tag: TypeTag,
    pub output: DomainValue,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// The per-run blackboard: the latest value produced for each type tag.
///
/// A later value of the same type shadows the earlier one. Only the process
/// executor writes to a session; actions see it read-only through their
/// context.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    values: HashMap<TypeTag, DomainValue>,
    log: Vec<SessionRecord>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            values: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// Creates a session holding the initial input.
    pub fn seeded(initial: &TypedValue) -> Self {
        let mut session = Session::new();
        session.bind(initial.tag.clone(), initial.value.clone());
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, tag: &TypeTag) -> Option<&DomainValue> {
        self.values.get(tag)
    }

    /// The latest value of domain type `T`, if one was produced.
    pub fn value<T: DomainType>(&self) -> Option<Result<T, ActionError>> {
        let tag = TypeTag::of::<T>();
        self.values.get(&tag).map(|value| {
            serde_json::from_value(value.clone())
                .map_err(|source| ActionError::InvalidInput { tag, source })
        })
    }

    pub fn contains(&self, tag: &TypeTag) -> bool {
        self.values.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &TypeTag> {
        self.values.keys()
    }

    /// The executed actions, oldest first.
    pub fn log(&self) -> &[SessionRecord] {
        &self.log
    }

    /// Output of the most recently executed action.
    pub fn last_result(&self) -> Option<&DomainValue> {
        self.log.last().map(|r| &r.output)
    }

    pub(crate) fn bind(&mut self, tag: TypeTag, value: DomainValue) -> Option<DomainValue> {
        let previous = self.values.insert(tag.clone(), value);
        if previous.is_some() {
            log::debug!("Session {}: new '{}' value shadows the previous one", self.id, tag);
        }
        previous
    }

    pub(crate) fn record(&mut self, record: SessionRecord) {
        self.log.push(record);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
