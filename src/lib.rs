//! hsm-sequencer: a hierarchical state machine with sequenced activities.
//!
//! States form a tree with exactly one active path from the root to a leaf.
//! Entering and exiting states triggers *activities*, cancellable units of
//! work that may span many frames. A transition runs in three steps:
//! deactivate the activities of the exiting states, switch the active path,
//! activate the activities of the entered states.
//!
//! # Core Concepts
//!
//! - **State**: behavior hooks for one node of the tree via the `State` trait
//! - **Activity**: cancellable work run when a state is entered or exited
//! - **Sequencer**: runs each phase sequentially or in parallel and coalesces
//!   requests that arrive mid-transition (the newest one wins)
//! - **Builder**: declares the tree and validates it in one pass
//!
//! # Example
//!
//! ```rust
//! use hsm_sequencer::activity::{ActivityExt, CallbackActivity};
//! use hsm_sequencer::builder::MachineBuilder;
//! use hsm_sequencer::core::{Composite, Guard};
//! use std::time::Duration;
//!
//! struct Input {
//!     sprint: bool,
//! }
//!
//! let mut builder = MachineBuilder::<Input>::new("Root", Composite);
//! let root = builder.root();
//! let locomotion = builder.add_child(root, "Locomotion", Composite);
//! let idle = builder.add_child(locomotion, "Idle", Composite);
//! let sprint = builder.add_child(locomotion, "Sprint", Composite);
//! builder
//!     .add_activity(sprint, CallbackActivity::noop("dust").delayed(Duration::ZERO))
//!     .transition_when(idle, "Sprint", Guard::new(|input: &Input| input.sprint));
//!
//! let mut machine = builder.build().unwrap();
//! let mut input = Input { sprint: false };
//! machine.tick(&mut input, 0.016).unwrap();
//! assert_eq!(machine.active_path(), "Root > Locomotion > Idle");
//!
//! input.sprint = true;
//! machine.tick(&mut input, 0.016).unwrap();
//! machine.tick(&mut input, 0.016).unwrap();
//! assert_eq!(machine.active_path(), "Root > Locomotion > Sprint");
//! ```

pub mod activity;
pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod phase;

// Re-export commonly used types
pub use activity::{Activity, ActivityError, ActivityMode};
pub use builder::{BuildError, MachineBuilder};
pub use config::{MachineConfig, PhaseStrategy};
pub use crate::core::{Guard, State, StateId};
pub use machine::{MachineError, StateMachine};
