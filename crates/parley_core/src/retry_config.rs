//! Retry schedule configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff parameters for the retry executor.
///
/// # Examples
///
/// ```
/// use parley_core::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default();
/// assert_eq!(config.nominal_delay(0), Duration::from_millis(1000));
/// assert_eq!(config.nominal_delay(1), Duration::from_millis(2000));
/// assert_eq!(config.nominal_delay(2), Duration::from_millis(4000));
/// // Capped at max_delay_ms
/// assert_eq!(config.nominal_delay(10), Duration::from_millis(30_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[serde(default, deny_unknown_fields)]
#[setters(prefix = "with_")]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1).
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier applied per attempt.
    pub exponential_base: f64,
    /// Perturb each delay by up to ±25%.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Configuration that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Total number of attempts, including the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the retry that follows `attempt` (0-based), without jitter.
    ///
    /// `min(base_delay_ms * exponential_base^attempt, max_delay_ms)`
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.base_delay_ms as f64 * self.exponential_base.powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Validates the schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the base is below 1.0, not finite, or the base
    /// delay exceeds the maximum delay.
    pub fn validate(&self) -> Result<(), String> {
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(format!(
                "exponential_base must be a finite value >= 1.0, got {}",
                self.exponential_base
            ));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "base_delay_ms ({}) must not exceed max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}
