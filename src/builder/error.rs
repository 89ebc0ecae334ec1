//! Build errors for the machine builder.

use crate::core::StateId;
use thiserror::Error;

/// One structural problem found in a declared tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeViolation {
    #[error("state {state} has an empty name")]
    EmptyName { state: StateId },

    #[error("state name '{name}' is declared {count} times")]
    DuplicateName { name: String, count: usize },

    #[error("state '{state}' names parent {parent}, which is not declared before it")]
    UnknownParent { state: String, parent: StateId },

    #[error("activity '{activity}' is attached to undeclared state {state}")]
    UnknownActivityOwner { activity: String, state: StateId },

    #[error("state '{state}' owns more than one activity named '{activity}'")]
    DuplicateActivity { state: String, activity: String },

    #[error("transition rule is attached to undeclared state {state}")]
    UnknownRuleOwner { state: StateId },

    #[error("transition rule of state '{state}' targets undeclared state '{target}'")]
    UnknownRuleTarget { state: String, target: String },
}

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Every violation found, not just the first one.
    #[error("invalid state tree: {}", summarize(.violations))]
    InvalidTree { violations: Vec<TreeViolation> },
}

impl BuildError {
    pub fn violations(&self) -> &[TreeViolation] {
        match self {
            Self::InvalidTree { violations } => violations,
        }
    }
}

fn summarize(violations: &[TreeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
