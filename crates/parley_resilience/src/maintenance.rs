//! Periodic eviction of stale per-service state.

use crate::CircuitBreakerRegistry;
use parley_rate_limit::{MaintenanceConfig, RateLimiter};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired rate-limit windows
    pub windows: usize,
    /// Breakers quiet for longer than the retention period
    pub breakers: usize,
}

/// Sweep expired windows and idle breakers once.
pub fn sweep_once(
    registry: &CircuitBreakerRegistry,
    limiter: &RateLimiter,
    retention: Duration,
) -> SweepReport {
    SweepReport {
        windows: limiter.sweep(),
        breakers: registry.sweep(retention),
    }
}

/// Run [`sweep_once`] every `sweep_interval` until `token` is cancelled.
///
/// The first sweep happens one interval after spawning.
///
/// # Example
///
/// ```no_run
/// use parley_rate_limit::{MaintenanceConfig, RateLimiter};
/// use parley_resilience::{CircuitBreakerRegistry, spawn_maintenance};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let token = CancellationToken::new();
/// let handle = spawn_maintenance(
///     Arc::new(CircuitBreakerRegistry::new()),
///     Arc::new(RateLimiter::unlimited()),
///     MaintenanceConfig::default(),
///     token.clone(),
/// );
///
/// token.cancel();
/// handle.await.ok();
/// # }
/// ```
pub fn spawn_maintenance(
    registry: Arc<CircuitBreakerRegistry>,
    limiter: Arc<RateLimiter>,
    config: MaintenanceConfig,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.sweep_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = config.sweep_interval_ms, "Maintenance task started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let report = sweep_once(&registry, &limiter, config.retention());
                    debug!(windows = report.windows, breakers = report.breakers, "Maintenance sweep");
                }
            }
        }

        info!("Maintenance task stopped");
    })
}
