//! Per-execution retry context.

use crate::ServiceKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context threaded through one execution of the retry executor.
///
/// Everything but the attempt counter and the last error message is fixed
/// at construction. The context travels with every classified error so that
/// callers can tell which service failed, on which attempt, and how long the
/// whole execution took.
///
/// # Examples
///
/// ```
/// use parley_core::{RetryContext, ServiceKey};
///
/// let ctx = RetryContext::new(&ServiceKey::new("gemini", "translation"), 4)
///     .with_attempt(2)
///     .with_last_error("HTTP 503");
/// assert_eq!(*ctx.attempt(), 2);
/// assert_eq!(*ctx.total_attempts(), 4);
/// assert_eq!(ctx.last_error().as_deref(), Some("HTTP 503"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct RetryContext {
    /// Endpoint half of the service key.
    endpoint: String,
    /// Provider half of the service key.
    provider: String,
    /// Current attempt, 1-based.
    attempt: u32,
    /// Maximum number of attempts this execution may make.
    total_attempts: u32,
    /// Message of the most recent failure, if any.
    last_error: Option<String>,
    /// Wall-clock time the execution started.
    started_at: DateTime<Utc>,
}

impl RetryContext {
    /// Start a new context for `key`, before the first attempt.
    pub fn new(key: &ServiceKey, total_attempts: u32) -> Self {
        Self {
            endpoint: key.endpoint().to_string(),
            provider: key.provider().to_string(),
            attempt: 0,
            total_attempts,
            last_error: None,
            started_at: Utc::now(),
        }
    }

    /// Copy of this context positioned at `attempt`.
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// Copy of this context carrying `message` as the last error.
    pub fn with_last_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }

    /// Service key this context belongs to.
    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(self.provider.clone(), self.endpoint.clone())
    }

    /// Wall-clock time elapsed since the execution started.
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.started_at)
    }

    /// Whether the attempt counter has reached the configured maximum.
    pub fn is_last_attempt(&self) -> bool {
        self.attempt >= self.total_attempts
    }
}
