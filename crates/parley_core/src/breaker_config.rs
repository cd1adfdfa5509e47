//! Circuit breaker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds and timeouts for a circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_setters::Setters)]
#[serde(default, deny_unknown_fields)]
#[setters(prefix = "with_")]
pub struct CircuitBreakerConfig {
    /// Failures (within one monitoring period) that open the breaker.
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing a probe.
    pub reset_timeout_ms: u64,
    /// Failures further apart than this restart the count.
    pub monitoring_period_ms: u64,
    /// Concurrent probes admitted while half-open; 0 admits every caller.
    pub half_open_max_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 60_000,
            monitoring_period_ms: 300_000,
            half_open_max_probes: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Reset timeout as a `Duration`.
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// Monitoring period as a `Duration`.
    pub fn monitoring_period(&self) -> Duration {
        Duration::from_millis(self.monitoring_period_ms)
    }

    /// Validates the thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if the failure threshold is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be at least 1".to_string());
        }
        Ok(())
    }
}
