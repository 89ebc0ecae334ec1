//! Phase runners: one batch of activity operations per transition direction.
//!
//! A transition has an exit phase (deactivations) and an enter phase
//! (activations). Each phase is a [`Sequence`] built from the ordered steps
//! of every state in that direction's chain, and is polled once per tick
//! until it reports done.

mod parallel;
mod sequential;

pub use parallel::ParallelPhase;
pub use sequential::SequentialPhase;

use crate::activity::{Activity, ActivityError, ActivityFuture, ActivitySlot, ModeCell, Operation};
use crate::config::PhaseStrategy;
use crate::machine::MachineError;
use futures_util::task::noop_waker_ref;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;

/// A batch of activity operations run to completion over several ticks.
pub trait Sequence: Send {
    /// Launch the first operation (sequential) or all of them (parallel).
    fn start(&mut self) -> Result<(), MachineError>;

    /// Poll in-flight operations. Returns true once every operation finished,
    /// and keeps returning true afterwards.
    fn update(&mut self) -> Result<bool, MachineError>;

    fn is_done(&self) -> bool;

    fn steps(&self) -> &[Step];
}

/// Build the phase for `steps` using `strategy`.
///
/// An empty batch always yields a [`NoopPhase`].
pub(crate) fn build(strategy: PhaseStrategy, steps: Vec<Step>) -> Box<dyn Sequence> {
    if steps.is_empty() {
        return Box::new(NoopPhase::default());
    }
    match strategy {
        PhaseStrategy::Sequential => Box::new(SequentialPhase::new(steps)),
        PhaseStrategy::Parallel => Box::new(ParallelPhase::new(steps)),
    }
}

/// Phase with nothing to run; done on its first update.
#[derive(Debug, Default)]
pub struct NoopPhase {
    done: bool,
}

impl Sequence for NoopPhase {
    fn start(&mut self) -> Result<(), MachineError> {
        Ok(())
    }

    fn update(&mut self) -> Result<bool, MachineError> {
        self.done = true;
        Ok(true)
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn steps(&self) -> &[Step] {
        &[]
    }
}

/// How a step finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The operation resolved and the activity's mode was flipped.
    Completed,
    /// The token was cancelled before the operation completed, or after it
    /// faulted; the mode was left alone.
    Cancelled,
}

enum Progress {
    Idle,
    Running(ActivityFuture),
    Finished(StepOutcome),
    Faulted,
}

/// One activity operation inside a phase.
pub struct Step {
    state: String,
    activity: Arc<dyn Activity>,
    mode: ModeCell,
    operation: Operation,
    token: CancellationToken,
    progress: Progress,
}

impl Step {
    pub(crate) fn new(
        state: &str,
        slot: &ActivitySlot,
        operation: Operation,
        token: CancellationToken,
    ) -> Self {
        Self {
            state: state.to_string(),
            activity: Arc::clone(&slot.activity),
            mode: slot.mode.clone(),
            operation,
            token,
            progress: Progress::Idle,
        }
    }

    /// Name of the state owning the activity.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn activity(&self) -> &str {
        self.activity.name()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.progress, Progress::Idle)
    }

    pub fn outcome(&self) -> Option<StepOutcome> {
        match self.progress {
            Progress::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn launch(&self) -> ActivityFuture {
        tracing::trace!(
            state = %self.state,
            activity = self.activity.name(),
            operation = %self.operation,
            "launching activity step"
        );
        match self.operation {
            Operation::Activate => self.activity.activate(self.token.clone()),
            Operation::Deactivate => self.activity.deactivate(self.token.clone()),
        }
    }

    /// Launch the operation if needed and poll it once.
    ///
    /// Returns true when the step is finished. A cancelled token finishes the
    /// step without polling the operation again. A faulted step reports its
    /// error once and stays unfinished until the token is cancelled.
    pub(crate) fn poll(&mut self) -> Result<bool, MachineError> {
        if let Progress::Finished(_) = self.progress {
            return Ok(true);
        }
        if self.token.is_cancelled() {
            return Ok(self.finish(StepOutcome::Cancelled));
        }
        match self.progress {
            Progress::Idle => self.progress = Progress::Running(self.launch()),
            Progress::Faulted => return Ok(false),
            _ => {}
        }
        let Progress::Running(future) = &mut self.progress else {
            return Ok(false);
        };

        let mut cx = Context::from_waker(noop_waker_ref());
        let result = match future.as_mut().poll(&mut cx) {
            Poll::Pending => return Ok(false),
            Poll::Ready(result) => result,
        };

        match result {
            Ok(()) => {
                self.mode.set(self.operation.resulting_mode());
                Ok(self.finish(StepOutcome::Completed))
            }
            Err(ActivityError::Cancelled) => Ok(self.finish(StepOutcome::Cancelled)),
            Err(source) => {
                self.progress = Progress::Faulted;
                Err(MachineError::Activity {
                    state: self.state.clone(),
                    activity: self.activity.name().to_string(),
                    operation: self.operation,
                    source,
                })
            }
        }
    }

    fn finish(&mut self, outcome: StepOutcome) -> bool {
        tracing::trace!(
            state = %self.state,
            activity = self.activity.name(),
            operation = %self.operation,
            ?outcome,
            "activity step finished"
        );
        self.progress = Progress::Finished(outcome);
        true
    }
}
