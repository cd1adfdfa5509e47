//! Per-service circuit breakers.
//!
//! Each [`ServiceKey`] owns an independent closed → open → half-open state
//! machine. Entries are created lazily on the first failure and evicted by
//! [`CircuitBreakerRegistry::sweep`] once they have been quiet long enough.

use crate::ResilienceMetrics;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::{CircuitBreakerConfig, ServiceKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Circuit breaker state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow normally; failures are counted.
    Closed,
    /// Calls are rejected until the reset timeout elapses.
    Open,
    /// A limited number of probe calls decide whether to close or reopen.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct Breaker {
    state: CircuitState,
    failure_count: u32,
    last_failure: Instant,
    last_failure_at: DateTime<Utc>,
    next_attempt: Option<Instant>,
    probes: u32,
    probe_deadline: Option<Instant>,
    config: CircuitBreakerConfig,
}

impl Breaker {
    fn new(now: Instant, config: &CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: now,
            last_failure_at: Utc::now(),
            next_attempt: None,
            probes: 0,
            probe_deadline: None,
            config: config.clone(),
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.next_attempt = Some(now + self.config.reset_timeout());
        self.probes = 0;
        self.probe_deadline = None;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.next_attempt = None;
        self.probes = 0;
        self.probe_deadline = None;
    }

    fn try_probe(&mut self, now: Instant) -> bool {
        if self.probe_deadline.is_some_and(|deadline| now >= deadline) {
            self.probes = 0;
        }
        let limit = self.config.half_open_max_probes;
        if limit != 0 && self.probes >= limit {
            return false;
        }
        self.probes += 1;
        self.probe_deadline = Some(now + self.config.reset_timeout());
        true
    }
}

/// Snapshot of one breaker for observability.
#[derive(Debug, Clone, PartialEq, Serialize, derive_getters::Getters)]
pub struct CircuitStatus {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: DateTime<Utc>,
    /// Time until an open breaker admits a probe.
    retry_in: Option<Duration>,
}

/// Registry of circuit breakers keyed by provider endpoint.
///
/// All transitions for one key happen under that key's map entry, so
/// concurrent callers observe a consistent state machine while unrelated
/// keys never contend.
///
/// # Example
///
/// ```
/// use parley_core::{CircuitBreakerConfig, ServiceKey};
/// use parley_resilience::{CircuitBreakerRegistry, CircuitState};
///
/// # #[tokio::main]
/// # async fn main() {
/// let registry = CircuitBreakerRegistry::new();
/// let key = ServiceKey::new("openai", "conversation");
/// let config = CircuitBreakerConfig::default().with_failure_threshold(2);
///
/// registry.on_failure(&key, &config);
/// assert!(registry.is_allowed(&key));
/// registry.on_failure(&key, &config);
/// assert!(!registry.is_allowed(&key));
/// assert_eq!(*registry.status(&key).unwrap().state(), CircuitState::Open);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<ServiceKey, Breaker>,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a call to `key` may proceed.
    ///
    /// An open breaker whose reset timeout has elapsed moves to half-open on
    /// this check and admits the caller as a probe.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn is_allowed(&self, key: &ServiceKey) -> bool {
        let Some(mut breaker) = self.breakers.get_mut(key) else {
            return true;
        };
        let now = Instant::now();

        match breaker.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let ready = breaker.next_attempt.is_none_or(|at| now >= at);
                if !ready {
                    debug!("Breaker open, rejecting");
                    return false;
                }
                breaker.state = CircuitState::HalfOpen;
                breaker.probes = 0;
                breaker.probe_deadline = None;
                info!("Circuit breaker half-open, admitting probe");
                ResilienceMetrics::get().record_breaker_transition(key, CircuitState::HalfOpen);
                breaker.try_probe(now)
            }
            CircuitState::HalfOpen => {
                let admitted = breaker.try_probe(now);
                if !admitted {
                    debug!(probes = breaker.probes, "Probe limit reached, rejecting");
                }
                admitted
            }
        }
    }

    /// Record a successful call. Closes a half-open breaker.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn on_success(&self, key: &ServiceKey) {
        let Some(mut breaker) = self.breakers.get_mut(key) else {
            return;
        };
        if breaker.state == CircuitState::HalfOpen {
            breaker.close();
            info!("Circuit breaker closed after successful probe");
            ResilienceMetrics::get().record_breaker_transition(key, CircuitState::Closed);
        }
    }

    /// Record a failed call and return the resulting state.
    ///
    /// Failures further apart than the monitoring period restart the count.
    /// A failure while half-open reopens the breaker.
    #[instrument(skip(self, key, config), fields(key = %key))]
    pub fn on_failure(&self, key: &ServiceKey, config: &CircuitBreakerConfig) -> CircuitState {
        let now = Instant::now();
        let mut breaker = self
            .breakers
            .entry(key.clone())
            .or_insert_with(|| Breaker::new(now, config));
        breaker.config = config.clone();

        let stale = now.saturating_duration_since(breaker.last_failure) > config.monitoring_period();
        breaker.last_failure = now;
        breaker.last_failure_at = Utc::now();

        match breaker.state {
            CircuitState::HalfOpen => {
                breaker.failure_count = breaker.failure_count.saturating_add(1);
                breaker.open(now);
                info!("Probe failed, circuit breaker reopened");
                ResilienceMetrics::get().record_breaker_transition(key, CircuitState::Open);
            }
            CircuitState::Open => {
                breaker.failure_count = breaker.failure_count.saturating_add(1);
                debug!("Failure reported while open");
            }
            CircuitState::Closed => {
                breaker.failure_count = if stale {
                    1
                } else {
                    breaker.failure_count.saturating_add(1)
                };
                debug!(
                    failure_count = breaker.failure_count,
                    threshold = config.failure_threshold,
                    "Failure recorded"
                );
                if breaker.failure_count >= config.failure_threshold {
                    breaker.open(now);
                    info!(
                        failure_count = breaker.failure_count,
                        "Circuit breaker opened"
                    );
                    ResilienceMetrics::get().record_breaker_transition(key, CircuitState::Open);
                }
            }
        }

        breaker.state
    }

    /// Return a probe lease that will never report an outcome.
    pub fn release_probe(&self, key: &ServiceKey) {
        if let Some(mut breaker) = self.breakers.get_mut(key)
            && breaker.state == CircuitState::HalfOpen
        {
            breaker.probes = breaker.probes.saturating_sub(1);
        }
    }

    /// Snapshot of one breaker, if it exists.
    pub fn status(&self, key: &ServiceKey) -> Option<CircuitStatus> {
        let now = Instant::now();
        self.breakers.get(key).map(|breaker| snapshot(&breaker, now))
    }

    /// Snapshot of every breaker.
    pub fn status_all(&self) -> HashMap<ServiceKey, CircuitStatus> {
        let now = Instant::now();
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), snapshot(entry.value(), now)))
            .collect()
    }

    /// Forget one breaker. Returns whether it existed.
    pub fn reset(&self, key: &ServiceKey) -> bool {
        self.breakers.remove(key).is_some()
    }

    /// Forget every breaker.
    pub fn reset_all(&self) {
        self.breakers.clear();
    }

    /// Number of tracked breakers.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Whether no breaker is tracked.
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Evict breakers whose last failure is older than `retention`.
    /// Returns how many were removed.
    #[instrument(skip(self))]
    pub fn sweep(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.breakers.len();
        self.breakers
            .retain(|_, breaker| now.saturating_duration_since(breaker.last_failure) < retention);
        let removed = before.saturating_sub(self.breakers.len());
        debug!(removed, "Swept idle circuit breakers");
        removed
    }
}

fn snapshot(breaker: &Breaker, now: Instant) -> CircuitStatus {
    let retry_in = match (breaker.state, breaker.next_attempt) {
        (CircuitState::Open, Some(at)) => Some(at.saturating_duration_since(now)),
        _ => None,
    };
    CircuitStatus {
        state: breaker.state,
        failure_count: breaker.failure_count,
        last_failure_at: breaker.last_failure_at,
        retry_in,
    }
}
