//! Explicit construction of state trees.
//!
//! States, activities and guard rules are declared against a
//! [`MachineBuilder`]; `build` validates the whole declaration and either
//! returns a ready [`StateMachine`](crate::machine::StateMachine) or every
//! structural violation it found.

mod error;
mod machine;
mod validation;

pub use error::{BuildError, TreeViolation};
pub use machine::MachineBuilder;
