//! Guard predicates for declarative transitions.
//!
//! Guards are pure boolean functions over the host context. A state can
//! carry a list of `(guard, target)` rules that are checked when its own
//! [`State::transition`](super::State::transition) hook returns nothing.

use super::state::StateId;

/// Pure predicate over the host context.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::core::Guard;
///
/// struct Ctx {
///     stamina: u32,
/// }
///
/// let can_sprint = Guard::new(|ctx: &Ctx| ctx.stamina > 10);
///
/// assert!(can_sprint.check(&Ctx { stamina: 50 }));
/// assert!(!can_sprint.check(&Ctx { stamina: 3 }));
/// ```
pub struct Guard<C> {
    predicate: Box<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Create a guard from a predicate.
    ///
    /// The predicate must be deterministic for a given context and free of
    /// side effects.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    pub fn check(&self, ctx: &C) -> bool {
        (self.predicate)(ctx)
    }
}

/// A guard paired with the state it leads to.
pub(crate) struct TransitionRule<C> {
    pub(crate) guard: Guard<C>,
    pub(crate) target: StateId,
}

impl<C> TransitionRule<C> {
    pub(crate) fn evaluate(&self, ctx: &C) -> Option<StateId> {
        self.guard.check(ctx).then_some(self.target)
    }
}
