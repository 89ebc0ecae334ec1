//! State tree types and structural logic.
//!
//! This module contains the synchronous core of the machine:
//! - The `State` trait implemented by behavior authors
//! - The arena-backed tree with LCA and exit/enter chain computation
//! - Guard predicates for declarative transitions
//! - A bounded transition log for diagnostics
//!
//! Nothing here polls activities; that is the sequencer's job.

mod guard;
mod history;
mod state;
mod tree;

pub use guard::Guard;
pub use history::{TransitionLog, TransitionOutcome, TransitionRecord};
pub use state::{Composite, HookError, HookResult, Scope, State, StateId};
pub use tree::{PathToRoot, StateTree, Topology, TransitionPlan, TransitionRequest};

pub(crate) use guard::TransitionRule;
pub(crate) use tree::StateSlot;

#[cfg(test)]
pub(crate) use tree::fixtures;
