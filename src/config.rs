//! Machine configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of transitions kept in the transition log.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

/// How the activity operations of one phase are scheduled.
///
/// One strategy applies to every transition of a machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStrategy {
    /// One operation at a time, in chain order.
    #[default]
    Sequential,
    /// Every operation launched in the same tick.
    Parallel,
}

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid machine configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings of one state machine.
///
/// # Example
///
/// ```rust
/// use hsm_sequencer::config::{MachineConfig, PhaseStrategy};
///
/// let config = MachineConfig::from_json(r#"{ "phase_strategy": "parallel" }"#).unwrap();
///
/// assert_eq!(config.phase_strategy, PhaseStrategy::Parallel);
/// assert_eq!(config.history_capacity, 32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    pub phase_strategy: PhaseStrategy,
    /// Number of finished transitions kept for diagnostics; 0 disables the log.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            phase_strategy: PhaseStrategy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_strategy(mut self, strategy: PhaseStrategy) -> Self {
        self.phase_strategy = strategy;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}
