//! Activities: cancellable units of work bound to a state.
//!
//! An activity is activated when its owning state is entered and deactivated
//! when the state is exited. Both operations return futures that the machine
//! polls once per tick, so an operation may span any number of frames.
//!
//! # Key Concepts
//!
//! - **Mode**: `Inactive` until an activation completes, `Active` until a
//!   deactivation completes
//! - **Cancellation**: every operation receives a [`CancellationToken`];
//!   a cancelled operation leaves the mode untouched
//! - **Composition**: wrappers such as [`Delayed`] add behavior around an
//!   inner activity and forward the same token to it

mod delay;

pub use delay::{Delay, Delayed};

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Future returned by activity operations.
pub type ActivityFuture = BoxFuture<'static, Result<(), ActivityError>>;

/// Errors an activity operation can resolve with.
#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    /// The operation observed its token and stopped early.
    /// Not a fault: the phase treats it as finished without a mode change.
    #[error("activity operation was cancelled")]
    Cancelled,

    #[error("activity failed: {0}")]
    Failed(String),

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Whether an activity is currently activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityMode {
    /// Not yet activated, or already deactivated.
    Inactive,
    /// Activation completed and no deactivation has completed since.
    Active,
}

/// Which of the two activity operations a phase step runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Activate,
    Deactivate,
}

impl Operation {
    /// Mode an activity must be in to take part in this operation.
    pub fn required_mode(self) -> ActivityMode {
        match self {
            Self::Activate => ActivityMode::Inactive,
            Self::Deactivate => ActivityMode::Active,
        }
    }

    /// Mode an activity is left in once this operation completes.
    pub fn resulting_mode(self) -> ActivityMode {
        match self {
            Self::Activate => ActivityMode::Active,
            Self::Deactivate => ActivityMode::Inactive,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activate => f.write_str("activate"),
            Self::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// A unit of asynchronous work owned by a state.
///
/// Implementations describe the side effect only. The machine tracks the
/// [`ActivityMode`] and flips it when an operation completes successfully.
///
/// Returned futures must be `'static`: clone whatever shared handles the work
/// needs into the future instead of borrowing `self`. Side effects belong
/// inside the future so that nothing happens before the first poll.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::activity::{Activity, ActivityFuture};
/// use tokio_util::sync::CancellationToken;
///
/// struct Footsteps;
///
/// impl Activity for Footsteps {
///     fn name(&self) -> &str {
///         "footsteps"
///     }
///
///     fn activate(&self, _token: CancellationToken) -> ActivityFuture {
///         Box::pin(async { Ok(()) })
///     }
///
///     fn deactivate(&self, _token: CancellationToken) -> ActivityFuture {
///         Box::pin(async { Ok(()) })
///     }
/// }
/// ```
pub trait Activity: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Start the activation side effect.
    fn activate(&self, token: CancellationToken) -> ActivityFuture;

    /// Start the deactivation side effect.
    fn deactivate(&self, token: CancellationToken) -> ActivityFuture;
}

impl<A: Activity + ?Sized> Activity for Arc<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn activate(&self, token: CancellationToken) -> ActivityFuture {
        (**self).activate(token)
    }

    fn deactivate(&self, token: CancellationToken) -> ActivityFuture {
        (**self).deactivate(token)
    }
}

/// Combinators available on every activity.
pub trait ActivityExt: Activity + Sized + 'static {
    /// Wait `delay` before delegating activation to `self`.
    fn delayed(self, delay: Duration) -> Delayed<Self> {
        Delayed::new(self).activation_delay(delay)
    }
}

impl<A: Activity + Sized + 'static> ActivityExt for A {}

type Callback = Arc<dyn Fn() -> Result<(), ActivityError> + Send + Sync>;

/// Activity built from two synchronous closures.
///
/// Both operations complete on their first poll.
pub struct CallbackActivity {
    name: String,
    on_activate: Callback,
    on_deactivate: Callback,
}

impl CallbackActivity {
    pub fn new<A, D>(name: impl Into<String>, on_activate: A, on_deactivate: D) -> Self
    where
        A: Fn() -> Result<(), ActivityError> + Send + Sync + 'static,
        D: Fn() -> Result<(), ActivityError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            on_activate: Arc::new(on_activate),
            on_deactivate: Arc::new(on_deactivate),
        }
    }

    /// An activity whose operations do nothing but complete.
    pub fn noop(name: impl Into<String>) -> Self {
        Self::new(name, || Ok(()), || Ok(()))
    }
}

impl Activity for CallbackActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&self, _token: CancellationToken) -> ActivityFuture {
        let callback = Arc::clone(&self.on_activate);
        Box::pin(async move { callback() })
    }

    fn deactivate(&self, _token: CancellationToken) -> ActivityFuture {
        let callback = Arc::clone(&self.on_deactivate);
        Box::pin(async move { callback() })
    }
}

/// Shared mode flag of one activity.
///
/// Cloned into in-flight phase steps so completion is recorded even when
/// the owning state is not borrowed.
#[derive(Clone, Debug, Default)]
pub(crate) struct ModeCell(Arc<AtomicBool>);

impl ModeCell {
    pub(crate) fn get(&self) -> ActivityMode {
        if self.0.load(Ordering::Acquire) {
            ActivityMode::Active
        } else {
            ActivityMode::Inactive
        }
    }

    pub(crate) fn set(&self, mode: ActivityMode) {
        self.0
            .store(matches!(mode, ActivityMode::Active), Ordering::Release);
    }
}

/// An activity together with its mode, as owned by a state.
pub(crate) struct ActivitySlot {
    pub(crate) activity: Arc<dyn Activity>,
    pub(crate) mode: ModeCell,
}

impl ActivitySlot {
    pub(crate) fn new(activity: Arc<dyn Activity>) -> Self {
        Self {
            activity,
            mode: ModeCell::default(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.activity.name()
    }

    pub(crate) fn mode(&self) -> ActivityMode {
        self.mode.get()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn operation_modes_are_inverse() {
        assert_eq!(Operation::Activate.required_mode(), ActivityMode::Inactive);
        assert_eq!(Operation::Activate.resulting_mode(), ActivityMode::Active);
        assert_eq!(Operation::Deactivate.required_mode(), ActivityMode::Active);
        assert_eq!(
            Operation::Deactivate.resulting_mode(),
            ActivityMode::Inactive
        );
    }

    #[test]
    fn mode_cell_starts_inactive_and_is_shared() {
        let cell = ModeCell::default();
        let clone = cell.clone();
        assert_eq!(cell.get(), ActivityMode::Inactive);

        clone.set(ActivityMode::Active);
        assert_eq!(cell.get(), ActivityMode::Active);
    }

    #[test]
    fn callback_activity_runs_closures_lazily() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let activity = CallbackActivity::new(
            "count",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            || Err(ActivityError::Failed("stuck".to_string())),
        );

        let future = activity.activate(CancellationToken::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let result = future.now_or_never().expect("completes on first poll");
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let result = activity
            .deactivate(CancellationToken::new())
            .now_or_never()
            .expect("completes on first poll");
        assert!(matches!(result, Err(ActivityError::Failed(_))));
    }

    #[test]
    fn arc_activity_delegates() {
        let activity: Arc<dyn Activity> = Arc::new(CallbackActivity::noop("shared"));
        assert_eq!(Activity::name(&activity), "shared");
    }
}
