pub mod action;
pub mod agent;
pub mod context;
pub mod options;
pub mod parallel;
pub mod planner;
pub mod process;
pub mod session;
pub mod telemetry;
pub mod validation;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ActionError;

/// The Alias for serde_json::Value, the representation of every value held in a session
pub type DomainValue = serde_json::Value;

/// Identifies a domain type. The planner chains actions by matching these tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        TypeTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag registered for `T`.
    pub fn of<T: DomainType>() -> Self {
        TypeTag::new(T::TAG)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        TypeTag::new(tag)
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        TypeTag(tag)
    }
}

/// An opaque capability handle (web search, maps, ...) passed through to model calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolGroup(String);

impl ToolGroup {
    pub fn new(name: impl Into<String>) -> Self {
        ToolGroup(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToolGroup {
    fn from(name: &str) -> Self {
        ToolGroup::new(name)
    }
}

/// Binds a Rust type to the tag the planner knows it by.
///
/// # Example
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use telos::DomainType;
///
/// #[derive(Serialize, Deserialize)]
/// struct TravelPlan {
///     plan: String,
/// }
///
/// impl DomainType for TravelPlan {
///     const TAG: &'static str = "TravelPlan";
/// }
/// ```
pub trait DomainType: Serialize + DeserializeOwned {
    const TAG: &'static str;
}

/// A value paired with its type tag, the form initial inputs take.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub tag: TypeTag,
    pub value: DomainValue,
}

impl TypedValue {
    pub fn new(tag: impl Into<TypeTag>, value: DomainValue) -> Self {
        TypedValue {
            tag: tag.into(),
            value,
        }
    }

    /// Serializes a domain value under its registered tag.
    pub fn of<T: DomainType>(value: &T) -> Result<Self, ActionError> {
        let value = serde_json::to_value(value).map_err(ActionError::InvalidOutput)?;
        Ok(TypedValue::new(T::TAG, value))
    }

    /// Deserializes the value back into a domain type.
    pub fn decode<T: DomainType>(&self) -> Result<T, ActionError> {
        serde_json::from_value(self.value.clone()).map_err(|source| ActionError::InvalidInput {
            tag: self.tag.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Brief {
        dates: String,
    }

    impl DomainType for Brief {
        const TAG: &'static str = "Brief";
    }

    #[test]
    fn test_type_tag_of_domain_type() {
        assert_eq!(TypeTag::of::<Brief>(), TypeTag::new("Brief"));
        assert_eq!(TypeTag::from("Brief").to_string(), "Brief");
    }

    #[test]
    fn test_typed_value_roundtrip() {
        let brief = Brief {
            dates: "June 1-5".to_string(),
        };
        let typed = TypedValue::of(&brief).unwrap();
        assert_eq!(typed.tag.as_str(), "Brief");
        assert_eq!(typed.value, json!({"dates": "June 1-5"}));
        assert_eq!(typed.decode::<Brief>().unwrap(), brief);
    }

    #[test]
    fn test_typed_value_decode_reports_tag() {
        let typed = TypedValue::new("Brief", json!(42));
        match typed.decode::<Brief>() {
            Err(ActionError::InvalidInput { tag, .. }) => assert_eq!(tag.as_str(), "Brief"),
            other => panic!("Expected InvalidInput, got {:?}", other.map(|_| ())),
        }
    }
}
