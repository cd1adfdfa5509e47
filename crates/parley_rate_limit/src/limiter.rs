//! Fixed-window admission control.

use crate::{CostEstimator, CostModel, EndpointLimit, ParleyConfig, UsageStats};
use dashmap::DashMap;
use parley_core::{CostBasis, ServiceKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

/// Why a request was refused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum DenialReason {
    /// The window's request count is exhausted.
    #[display("Request limit exceeded")]
    RequestLimit,
    /// The request would push the window past its cost budget.
    #[display("Cost limit exceeded")]
    CostLimit,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    /// Request admitted; count and cost were reserved.
    Allowed,
    /// Request refused; nothing was reserved.
    Denied {
        /// Seconds until the window resets, rounded up
        retry_after_secs: u64,
        /// Which budget was exhausted
        reason: DenialReason,
    },
}

impl Admission {
    /// Whether the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    cost: f64,
    reset_at: Instant,
}

impl Window {
    fn fresh(now: Instant, length: Duration) -> Self {
        Self {
            count: 0,
            cost: 0.0,
            reset_at: now + length,
        }
    }
}

/// Point-in-time view of an endpoint's current window.
#[derive(Debug, Clone, Copy, PartialEq, derive_getters::Getters)]
pub struct WindowSnapshot {
    count: u32,
    cost: f64,
    resets_in: Duration,
}

/// Per-endpoint fixed-window rate limiter with cost budgets.
///
/// Each window resets wholesale once its reset time passes. Admission checks
/// and reservations happen under the per-key map entry, so concurrent callers
/// never over-admit.
///
/// # Example
///
/// ```
/// use parley_core::ServiceKey;
/// use parley_rate_limit::{EndpointLimit, RateLimiter};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let key = ServiceKey::new("openai", "conversation");
/// let limiter = RateLimiter::unlimited()
///     .with_limit(key.clone(), EndpointLimit::new(2, Duration::from_secs(60)));
///
/// assert!(limiter.check_and_reserve(&key, 1.0).is_allowed());
/// assert!(limiter.check_and_reserve(&key, 1.0).is_allowed());
/// assert!(!limiter.check_and_reserve(&key, 1.0).is_allowed());
/// # }
/// ```
#[derive(Default)]
pub struct RateLimiter {
    limits: HashMap<ServiceKey, EndpointLimit>,
    estimators: DashMap<ServiceKey, Arc<dyn CostEstimator>>,
    windows: DashMap<ServiceKey, Window>,
    usage: DashMap<ServiceKey, UsageStats>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limits", &self.limits)
            .field("estimators", &self.estimators.len())
            .field("windows", &self.windows.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a limiter from a table of endpoint limits.
    pub fn new(limits: HashMap<ServiceKey, EndpointLimit>) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Create a limiter from the `[rate_limits]` section of a configuration.
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self::new(config.endpoint_limits())
    }

    /// Create a limiter that admits everything.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Add or replace a limit.
    pub fn with_limit(mut self, key: ServiceKey, limit: EndpointLimit) -> Self {
        self.limits.insert(key, limit);
        self
    }

    /// Register a custom estimator, taking precedence over the configured model.
    pub fn with_estimator(self, key: ServiceKey, estimator: impl CostEstimator + 'static) -> Self {
        self.set_estimator(key, estimator);
        self
    }

    /// Register a custom estimator on a shared limiter.
    pub fn set_estimator(&self, key: ServiceKey, estimator: impl CostEstimator + 'static) {
        self.estimators.insert(key, Arc::new(estimator));
    }

    /// Limit configured for a key, if any.
    pub fn limit(&self, key: &ServiceKey) -> Option<&EndpointLimit> {
        self.limits.get(key)
    }

    /// Estimated cost of a request against `key`.
    ///
    /// Uses the registered estimator, else the endpoint's configured model,
    /// else one unit per request.
    pub fn estimate_cost(&self, key: &ServiceKey, basis: &CostBasis) -> f64 {
        let estimate = if let Some(estimator) = self.estimators.get(key) {
            estimator.estimate(basis)
        } else if let Some(limit) = self.limits.get(key) {
            limit.cost.estimate(basis)
        } else {
            CostModel::default().estimate(basis)
        };
        sanitize(estimate)
    }

    /// Admit a request and reserve its count and cost, or refuse it.
    ///
    /// An expired window is reset before the check. Refusals carry the
    /// number of whole seconds until the window resets.
    #[instrument(skip(self, key), fields(key = %key))]
    pub fn check_and_reserve(&self, key: &ServiceKey, estimated_cost: f64) -> Admission {
        let Some(limit) = self.limits.get(key) else {
            trace!("No limit configured, admitting");
            return Admission::Allowed;
        };
        let estimated_cost = sanitize(estimated_cost);
        let now = Instant::now();

        let mut window = self
            .windows
            .entry(key.clone())
            .or_insert_with(|| Window::fresh(now, limit.window()));

        if now >= window.reset_at {
            trace!("Window expired, resetting");
            *window = Window::fresh(now, limit.window());
        }

        let reason = if window.count.saturating_add(1) > limit.max_requests {
            Some(DenialReason::RequestLimit)
        } else {
            match limit.max_cost {
                Some(max_cost) if window.cost + estimated_cost > max_cost => {
                    Some(DenialReason::CostLimit)
                }
                _ => None,
            }
        };

        if let Some(reason) = reason {
            let remaining = window.reset_at.saturating_duration_since(now);
            let retry_after_secs = remaining.as_millis().div_ceil(1000) as u64;
            debug!(
                count = window.count,
                cost = window.cost,
                retry_after_secs,
                %reason,
                "Rate limit denied request"
            );
            return Admission::Denied {
                retry_after_secs,
                reason,
            };
        }

        window.count += 1;
        window.cost += estimated_cost;
        trace!(count = window.count, cost = window.cost, "Reserved");
        Admission::Allowed
    }

    /// Record a dispatched call in the usage counters.
    pub fn record_usage(&self, key: &ServiceKey, actual_cost: f64, success: bool) {
        self.usage
            .entry(key.clone())
            .or_default()
            .record(sanitize(actual_cost), success);
    }

    /// Usage recorded for a key.
    pub fn usage(&self, key: &ServiceKey) -> Option<UsageStats> {
        self.usage.get(key).map(|stats| stats.clone())
    }

    /// Usage recorded for every key.
    pub fn usage_snapshot(&self) -> HashMap<ServiceKey, UsageStats> {
        self.usage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Clear all usage counters.
    pub fn reset_usage(&self) {
        self.usage.clear();
    }

    /// Current window for a key, if one is live.
    pub fn window(&self, key: &ServiceKey) -> Option<WindowSnapshot> {
        let now = Instant::now();
        let window = self.windows.get(key)?;
        if now >= window.reset_at {
            return None;
        }
        Some(WindowSnapshot {
            count: window.count,
            cost: window.cost,
            resets_in: window.reset_at - now,
        })
    }

    /// Drop windows that have expired. Returns how many were removed.
    #[instrument(skip(self))]
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.reset_at);
        let removed = before.saturating_sub(self.windows.len());
        debug!(removed, "Swept expired rate limit windows");
        removed
    }
}

fn sanitize(cost: f64) -> f64 {
    if cost.is_finite() && cost > 0.0 {
        cost
    } else {
        0.0
    }
}
