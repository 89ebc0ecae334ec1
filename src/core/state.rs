//! The `State` trait implemented by behavior authors.
//!
//! A state is a node of the behavior tree. The machine owns the topology
//! (parents, children, the active child); implementations only supply the
//! hooks below and read the tree through a [`Scope`].

use super::tree::Topology;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type returned by state hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by state hooks.
pub type HookResult = Result<(), HookError>;

/// Handle of a state inside one machine.
///
/// Ids are only meaningful for the machine that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Position of the state in declaration order (the root is 0).
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only view of the tree from the point of view of one state.
///
/// Handed to [`State::initial_state`] and [`State::transition`] so they can
/// resolve their targets by name.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    topology: &'a Topology,
    id: StateId,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(topology: &'a Topology, id: StateId) -> Self {
        Self { topology, id }
    }

    /// The state this scope belongs to.
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.topology.name(self.id)
    }

    pub fn parent(&self) -> Option<StateId> {
        self.topology.parent(self.id)
    }

    pub fn children(&self) -> &'a [StateId] {
        self.topology.children(self.id)
    }

    pub fn active_child(&self) -> Option<StateId> {
        self.topology.active_child(self.id)
    }

    /// Direct child with the given name.
    pub fn child(&self, name: &str) -> Option<StateId> {
        self.topology
            .find(name)
            .filter(|id| self.topology.parent(*id) == Some(self.id))
    }

    /// Any state of the tree with the given name.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.topology.find(name)
    }

    /// Like [`Scope::find`], but a missing name is a wiring bug and panics.
    pub fn state(&self, name: &str) -> StateId {
        self.topology.find(name).unwrap_or_else(|| {
            panic!(
                "state '{}' refers to '{name}', which is not part of the tree",
                self.name()
            )
        })
    }
}

/// Behavior of one node in the state tree.
///
/// Every method has a no-op default, so a plain grouping state needs no
/// code at all. `C` is the host's context; the machine never writes to it.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::core::{HookResult, Scope, State, StateId};
///
/// struct Ctx {
///     sprint_held: bool,
/// }
///
/// struct Locomotion;
///
/// impl State<Ctx> for Locomotion {
///     fn initial_state(&self, scope: &Scope<'_>, _ctx: &Ctx) -> Option<StateId> {
///         scope.child("Idle")
///     }
///
///     fn transition(&mut self, scope: &Scope<'_>, ctx: &Ctx) -> Option<StateId> {
///         let target = if ctx.sprint_held { "Sprint" } else { "Idle" };
///         let target = scope.child(target)?;
///         (scope.active_child() != Some(target)).then_some(target)
///     }
///
///     fn on_update(&mut self, _ctx: &mut Ctx, _dt: f32) -> HookResult {
///         Ok(())
///     }
/// }
/// ```
pub trait State<C>: Send {
    /// Child to enter automatically after this state is entered.
    ///
    /// Must be a direct child; `None` makes this state a leaf.
    fn initial_state(&self, _scope: &Scope<'_>, _ctx: &C) -> Option<StateId> {
        None
    }

    /// Target this state wants to move to, evaluated every tick while active.
    ///
    /// Returning the state itself is treated as no transition.
    fn transition(&mut self, _scope: &Scope<'_>, _ctx: &C) -> Option<StateId> {
        None
    }

    fn on_enter(&mut self, _ctx: &mut C) -> HookResult {
        Ok(())
    }

    /// Called every tick while active, after the active child updated.
    fn on_update(&mut self, _ctx: &mut C, _dt: f32) -> HookResult {
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut C) -> HookResult {
        Ok(())
    }
}

/// A state with no behavior of its own.
///
/// Enters its first declared child, if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct Composite;

impl<C> State<C> for Composite {
    fn initial_state(&self, scope: &Scope<'_>, _ctx: &C) -> Option<StateId> {
        scope.children().first().copied()
    }
}
