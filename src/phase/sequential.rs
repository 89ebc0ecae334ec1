//! Strictly ordered phase.

use super::{Sequence, Step};
use crate::machine::MachineError;

/// Runs steps one after another in chain order.
///
/// Each update polls only the current step and launches the next one once it
/// finished, so a step never starts before its predecessor is done.
pub struct SequentialPhase {
    steps: Vec<Step>,
    index: usize,
    done: bool,
}

impl SequentialPhase {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            index: 0,
            done: false,
        }
    }
}

impl Sequence for SequentialPhase {
    fn start(&mut self) -> Result<(), MachineError> {
        if let Some(first) = self.steps.first_mut() {
            first.poll()?;
        }
        Ok(())
    }

    fn update(&mut self) -> Result<bool, MachineError> {
        if self.done {
            return Ok(true);
        }
        if let Some(current) = self.steps.get_mut(self.index) {
            if !current.poll()? {
                return Ok(false);
            }
            self.index += 1;
            if let Some(next) = self.steps.get_mut(self.index) {
                next.poll()?;
                return Ok(false);
            }
        }
        self.done = true;
        Ok(true)
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn steps(&self) -> &[Step] {
        &self.steps
    }
}
