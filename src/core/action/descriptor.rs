use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{ToolGroup, TypeTag};

/// The declared contract of an action: what it consumes, what it produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub name: String,
    pub inputs: Vec<TypeTag>,
    pub output: TypeTag,
    pub achieves_goal: bool,
    /// Human readable goal description, set when the action achieves a goal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_description: Option<String>,
    #[serde(default)]
    pub tool_groups: Vec<ToolGroup>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>, output: impl Into<TypeTag>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            output: output.into(),
            achieves_goal: false,
            goal_description: None,
            tool_groups: Vec::new(),
        }
    }

    /// Parses shorthand syntax: "name: input1, input2 -> output"
    pub fn parse(name: impl Into<String>, shorthand: &str) -> Result<Self, String> {
        let mut descriptor: ActionDescriptor = shorthand.parse()?;
        descriptor.name = name.into();
        Ok(descriptor)
    }

    /// Add a required input type.
    pub fn input(mut self, tag: impl Into<TypeTag>) -> Self {
        self.inputs.push(tag.into());
        self
    }

    /// Mark the action as achieving the goal of producing its output type.
    pub fn achieves_goal(mut self, description: impl Into<String>) -> Self {
        self.achieves_goal = true;
        self.goal_description = Some(description.into());
        self
    }

    /// Request a tool group to be handed to the action's model calls.
    pub fn tool_group(mut self, group: impl Into<ToolGroup>) -> Self {
        self.tool_groups.push(group.into());
        self
    }

    pub fn requires(&self, tag: &TypeTag) -> bool {
        self.inputs.contains(tag)
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<&str> = self.inputs.iter().map(TypeTag::as_str).collect();
        write!(f, "{}: {} -> {}", self.name, inputs.join(", "), self.output)
    }
}

impl FromStr for ActionDescriptor {
    type Err = String;

    /// Parses shorthand syntax: "[name:] input1, input2 -> output"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split("->").collect();
        if parts.len() != 2 {
            return Err("Action shorthand must contain exactly one '->'".to_string());
        }

        let (name, inputs) = match parts[0].split_once(':') {
            Some((name, inputs)) => (name.trim(), inputs),
            None => ("", parts[0]),
        };

        let output = parts[1].trim();
        if output.is_empty() || output.contains(',') {
            return Err(format!("Action must produce exactly one output type, got '{}'", output));
        }

        let inputs = inputs
            .split(',')
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(TypeTag::from)
            .collect();

        Ok(ActionDescriptor {
            inputs,
            ..ActionDescriptor::new(name, output)
        })
    }
}

/// Macro for rapid descriptor creation: action!("summarize: Document -> Summary")
#[macro_export]
macro_rules! action {
    ($s:expr) => {
        $s.parse::<$crate::core::action::descriptor::ActionDescriptor>()
            .expect("Invalid action shorthand")
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_parsing() {
        let descriptor: ActionDescriptor = "plan: TravelBrief, Findings -> TravelPlan".parse().unwrap();
        assert_eq!(descriptor.name, "plan");
        assert_eq!(
            descriptor.inputs,
            vec![TypeTag::new("TravelBrief"), TypeTag::new("Findings")]
        );
        assert_eq!(descriptor.output, TypeTag::new("TravelPlan"));
        assert!(!descriptor.achieves_goal);
    }

    #[test]
    fn test_shorthand_without_inputs() {
        let descriptor = ActionDescriptor::parse("seed", "-> Seed").unwrap();
        assert_eq!(descriptor.name, "seed");
        assert!(descriptor.inputs.is_empty());
    }

    #[test]
    fn test_shorthand_rejects_multiple_outputs() {
        assert!("a: X -> Y, Z".parse::<ActionDescriptor>().is_err());
        assert!("a: X".parse::<ActionDescriptor>().is_err());
    }

    #[test]
    fn test_builder_and_display() {
        let descriptor = ActionDescriptor::new("research", "Findings")
            .input("Brief")
            .input("Ideas")
            .tool_group("web")
            .achieves_goal("Research every idea");

        assert!(descriptor.achieves_goal);
        assert!(descriptor.requires(&TypeTag::new("Ideas")));
        assert_eq!(descriptor.tool_groups, vec![ToolGroup::new("web")]);
        assert_eq!(descriptor.to_string(), "research: Brief, Ideas -> Findings");
    }

    #[test]
    fn test_action_macro() {
        let descriptor = crate::action!("a: Input -> X");
        assert_eq!(descriptor.name, "a");
    }
}
