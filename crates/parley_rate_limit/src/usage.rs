//! Per-endpoint usage counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usage recorded for one service key.
///
/// Reporting only; admission decisions never read these counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Calls dispatched
    pub requests: u64,
    /// Cost units consumed
    pub cost: f64,
    /// Calls that failed
    pub errors: u64,
    /// Time of the most recent call
    pub last_request: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub(crate) fn record(&mut self, cost: f64, success: bool) {
        self.requests += 1;
        self.cost += cost.max(0.0);
        if !success {
            self.errors += 1;
        }
        self.last_request = Some(Utc::now());
    }

    /// Fraction of calls that failed, or 0.0 with no calls.
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.errors as f64 / self.requests as f64
        }
    }
}
