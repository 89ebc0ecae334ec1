//! Bounded log of finished transitions.
//!
//! Kept in memory for diagnostics only. Records hold state names rather than
//! ids so they stay readable after the machine is gone.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// How a transition ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Exit phase, switch and enter phase all ran.
    Completed,
    /// A newer request arrived during the exit phase; the switch was skipped.
    Superseded,
}

/// Record of one transition.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use hsm_sequencer::core::{TransitionLog, TransitionOutcome, TransitionRecord};
///
/// let mut log = TransitionLog::with_capacity(8);
/// log.record(TransitionRecord {
///     from: "Locomotion".to_string(),
///     to: "Sprint".to_string(),
///     lca: "Locomotion".to_string(),
///     outcome: TransitionOutcome::Completed,
///     started_at: Utc::now(),
///     finished_at: Utc::now(),
/// });
///
/// assert_eq!(log.targets(), ["Sprint"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRecord {
    /// State that requested the transition.
    pub from: String,
    pub to: String,
    pub lca: String,
    pub outcome: TransitionOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TransitionRecord {
    /// Time between the request being started and the transition ending.
    pub fn duration(&self) -> Duration {
        self.finished_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Most recent transitions, oldest first.
///
/// When full, recording a transition evicts the oldest one. A capacity of
/// zero disables recording.
#[derive(Clone, Debug)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::with_capacity(crate::config::DEFAULT_HISTORY_CAPACITY)
    }
}

impl TransitionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Targets of the transitions that completed, in order.
    pub fn targets(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.outcome == TransitionOutcome::Completed)
            .map(|r| r.to.as_str())
            .collect()
    }

    /// Total time from the first recorded start to the last recorded end.
    pub fn span(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.finished_at
            .signed_duration_since(first.started_at)
            .to_std()
            .ok()
    }
}
