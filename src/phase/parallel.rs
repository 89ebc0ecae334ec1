//! Phase that launches every step at once.

use super::{Sequence, Step};
use crate::machine::MachineError;

/// Launches all steps in `start` and polls every unfinished one per update.
///
/// No ordering is guaranteed between steps beyond launch order.
pub struct ParallelPhase {
    steps: Vec<Step>,
    done: bool,
}

impl ParallelPhase {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self { steps, done: false }
    }
}

impl Sequence for ParallelPhase {
    fn start(&mut self) -> Result<(), MachineError> {
        for step in &mut self.steps {
            step.poll()?;
        }
        Ok(())
    }

    fn update(&mut self) -> Result<bool, MachineError> {
        if self.done {
            return Ok(true);
        }
        let mut finished = true;
        for step in &mut self.steps {
            finished &= step.poll()?;
        }
        self.done = finished;
        Ok(finished)
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn steps(&self) -> &[Step] {
        &self.steps
    }
}
