//! The running machine and its transition sequencer.
//!
//! [`StateMachine`] owns the state tree and drives it once per `tick`.
//! [`TransitionSequencer`] turns transition requests into an exit phase,
//! the switch of the active path, and an enter phase.

mod error;
#[allow(clippy::module_inception)]
mod machine;
mod sequencer;

pub use error::{Hook, MachineError};
pub use machine::StateMachine;
pub use sequencer::{SequencerStatus, TransitionSequencer};
