//! Faults surfaced by a running machine.

use crate::activity::{ActivityError, Operation};
use crate::core::HookError;
use std::fmt;
use thiserror::Error;

/// The state hook that raised a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    Enter,
    Update,
    Exit,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("on_enter"),
            Self::Update => f.write_str("on_update"),
            Self::Exit => f.write_str("on_exit"),
        }
    }
}

/// Errors returned from `start`, `tick` and the transition entry points.
///
/// The machine is not rolled back: after a fault it stays in whatever
/// partial state the fault left it in, and callers should drop it.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("{hook} of state '{state}' failed: {source}")]
    Hook {
        state: String,
        hook: Hook,
        #[source]
        source: HookError,
    },

    #[error("{operation} of activity '{activity}' in state '{state}' failed: {source}")]
    Activity {
        state: String,
        activity: String,
        operation: Operation,
        #[source]
        source: ActivityError,
    },
}

impl MachineError {
    pub(crate) fn hook(state: &str, hook: Hook, source: HookError) -> Self {
        Self::Hook {
            state: state.to_string(),
            hook,
            source,
        }
    }

    /// Name of the state the fault belongs to.
    pub fn state(&self) -> &str {
        match self {
            Self::Hook { state, .. } | Self::Activity { state, .. } => state,
        }
    }
}
