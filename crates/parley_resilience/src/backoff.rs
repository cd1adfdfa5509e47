//! Exponential backoff with bounded jitter.

use parking_lot::Mutex;
use parley_core::RetryConfig;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Largest fraction of a delay that jitter may add or remove.
const JITTER_FRACTION: f64 = 0.25;

/// Perturb `delay` by a uniform amount in `±25%`, never below zero.
pub fn jittered(delay: Duration) -> Duration {
    let nominal = delay.as_secs_f64();
    let spread = nominal * JITTER_FRACTION;
    let offset = rand::thread_rng().gen_range(-spread..=spread);
    let total = nominal + offset;
    if total > 0.0 {
        Duration::from_secs_f64(total)
    } else {
        Duration::ZERO
    }
}

/// Delay schedule fed to the retry loop.
///
/// Yields one delay per retry (`max_retries` in total):
/// `min(base_delay_ms * exponential_base^n, max_delay_ms)`, jittered when
/// the policy asks for it. A pending override (set when the rate limiter
/// reports how long its window has left) replaces the next delay.
///
/// # Example
///
/// ```
/// use parley_core::RetryConfig;
/// use parley_resilience::BackoffSchedule;
/// use std::time::Duration;
///
/// let config = RetryConfig::default().with_jitter(false);
/// let delays: Vec<_> = BackoffSchedule::new(&config).collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_millis(1000),
///         Duration::from_millis(2000),
///         Duration::from_millis(4000),
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    config: RetryConfig,
    attempt: u32,
    override_next: Arc<Mutex<Option<Duration>>>,
}

impl BackoffSchedule {
    /// Schedule for a retry policy.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            attempt: 0,
            override_next: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle through which the next delay can be replaced.
    pub fn override_handle(&self) -> Arc<Mutex<Option<Duration>>> {
        Arc::clone(&self.override_next)
    }

    /// Delay after the given 0-based attempt, before any override.
    pub fn delay(&self, attempt: u32) -> Duration {
        let nominal = self.config.nominal_delay(attempt);
        if self.config.jitter {
            jittered(nominal)
        } else {
            nominal
        }
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_retries {
            return None;
        }
        let delay = match self.override_next.lock().take() {
            Some(delay) => delay,
            None => self.delay(self.attempt),
        };
        self.attempt += 1;
        Some(delay)
    }
}
