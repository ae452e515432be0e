//! Supervisor parameters - lifecycle timing control.
//!
//! [`SupervisorParams`] groups the timing knobs of the
//! [`EngineSupervisor`](crate::use_cases::supervise_engine::EngineSupervisor).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing parameters for the engine supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorParams {
    /// How long Loading may last before the process is torn down.
    pub load_timeout: Duration,
    /// How long a turn may stay in Generating before it is cancelled.
    /// `None` waits for the boundary or the process exit.
    pub turn_timeout: Option<Duration>,
    /// Time between the interrupt and the hard kill when tearing down.
    pub termination_grace: Duration,
}

impl Default for SupervisorParams {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(300),
            turn_timeout: None,
            termination_grace: Duration::from_secs(3),
        }
    }
}

impl SupervisorParams {
    // ==================== Builder Methods ====================

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }

    /// Build from second counts as they appear in config files.
    ///
    /// A turn timeout of `0` or `None` disables it.
    pub fn from_secs(load_timeout: u64, turn_timeout: Option<u64>, termination_grace: u64) -> Self {
        Self {
            load_timeout: Duration::from_secs(load_timeout),
            turn_timeout: turn_timeout.filter(|s| *s > 0).map(Duration::from_secs),
            termination_grace: Duration::from_secs(termination_grace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SupervisorParams::default();
        assert_eq!(params.load_timeout, Duration::from_secs(300));
        assert!(params.turn_timeout.is_none());
        assert_eq!(params.termination_grace, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_turn_timeout_disables_it() {
        let params = SupervisorParams::from_secs(60, Some(0), 1);
        assert!(params.turn_timeout.is_none());
        let params = SupervisorParams::from_secs(60, Some(120), 1);
        assert_eq!(params.turn_timeout, Some(Duration::from_secs(120)));
    }
}
