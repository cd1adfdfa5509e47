//! Metrics for the resilience pipeline.
//!
//! Provides OpenTelemetry counters for attempts, failures, breaker activity
//! and rate-limit denials, labelled by provider and endpoint.

use crate::CircuitState;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use parley_core::ServiceKey;
use parley_error::ClassifiedErrorKind;
use std::sync::OnceLock;
use std::time::Duration;

static METRICS: OnceLock<ResilienceMetrics> = OnceLock::new();

/// Metrics for retried, rate-limited and circuit-broken provider calls.
#[derive(Clone)]
pub struct ResilienceMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Dispatched attempts
    pub attempts: Counter<u64>,
    /// Failed attempts by classified kind
    pub failures: Counter<u64>,
    /// Calls refused by an open breaker
    pub breaker_rejections: Counter<u64>,
    /// Breaker state changes
    pub breaker_transitions: Counter<u64>,
    /// Attempts refused by the rate limiter
    pub rate_limit_denials: Counter<u64>,
    /// Backoff delays in seconds
    pub backoff: Histogram<f64>,
}

impl ResilienceMetrics {
    fn init() -> Self {
        let meter = global::meter("parley_resilience");

        Self {
            _meter: meter.clone(),
            attempts: meter
                .u64_counter("resilience.attempts")
                .with_description("Dispatched provider call attempts")
                .build(),
            failures: meter
                .u64_counter("resilience.failures")
                .with_description("Failed provider call attempts")
                .build(),
            breaker_rejections: meter
                .u64_counter("resilience.breaker.rejections")
                .with_description("Calls short-circuited by an open breaker")
                .build(),
            breaker_transitions: meter
                .u64_counter("resilience.breaker.transitions")
                .with_description("Circuit breaker state changes")
                .build(),
            rate_limit_denials: meter
                .u64_counter("resilience.rate_limit.denials")
                .with_description("Attempts refused by the rate limiter")
                .build(),
            backoff: meter
                .f64_histogram("resilience.backoff")
                .with_unit("seconds")
                .with_description("Delay before a retry")
                .build(),
        }
    }

    /// Get the global resilience metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a dispatched attempt and its outcome.
    pub fn record_attempt(&self, key: &ServiceKey, success: bool) {
        let mut labels = labels(key);
        labels.push(KeyValue::new(
            "outcome",
            if success { "success" } else { "failure" },
        ));
        self.attempts.add(1, &labels);
    }

    /// Record a classified failure.
    pub fn record_failure(&self, key: &ServiceKey, kind: ClassifiedErrorKind) {
        let mut labels = labels(key);
        labels.push(KeyValue::new("error_kind", kind.to_string()));
        self.failures.add(1, &labels);
    }

    /// Record a call refused by an open breaker.
    pub fn record_breaker_rejection(&self, key: &ServiceKey) {
        self.breaker_rejections.add(1, &labels(key));
    }

    /// Record a breaker moving into `state`.
    pub fn record_breaker_transition(&self, key: &ServiceKey, state: CircuitState) {
        let mut labels = labels(key);
        labels.push(KeyValue::new("state", state.to_string()));
        self.breaker_transitions.add(1, &labels);
    }

    /// Record a rate-limit denial.
    pub fn record_rate_limit_denial(&self, key: &ServiceKey, reason: &str) {
        let mut labels = labels(key);
        labels.push(KeyValue::new("reason", reason.to_string()));
        self.rate_limit_denials.add(1, &labels);
    }

    /// Record a backoff delay.
    pub fn record_backoff(&self, key: &ServiceKey, delay: Duration) {
        self.backoff.record(delay.as_secs_f64(), &labels(key));
    }
}

impl Default for ResilienceMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}

fn labels(key: &ServiceKey) -> Vec<KeyValue> {
    vec![
        KeyValue::new("provider", key.provider().to_string()),
        KeyValue::new("endpoint", key.endpoint().to_string()),
    ]
}
