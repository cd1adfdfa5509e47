//! Retry execution with rate limiting and circuit breaking.

use crate::{BackoffSchedule, CircuitBreakerRegistry, CircuitState, ResilienceMetrics};
use parking_lot::Mutex;
use parley_core::{CircuitBreakerConfig, CostBasis, RetryConfig, RetryContext, ServiceKey};
use parley_error::{ClassifiedError, ParleyResult, RawFailure, classify};
use parley_rate_limit::{Admission, ParleyConfig, RateLimiter};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// What is being called: the service key plus the size of the request.
///
/// # Example
///
/// ```
/// use parley_core::CostBasis;
/// use parley_resilience::CallContext;
///
/// let call = CallContext::new("openai", "speech").with_cost(CostBasis::characters(120));
/// assert_eq!(call.key().endpoint(), "speech");
/// assert_eq!(call.cost().characters, 120);
/// ```
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct CallContext {
    key: ServiceKey,
    cost: CostBasis,
}

impl CallContext {
    /// Call to `provider`'s `endpoint` with an empty cost basis.
    pub fn new(provider: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::from(ServiceKey::new(provider, endpoint))
    }

    /// Attach the request size used for cost estimation.
    pub fn with_cost(mut self, cost: CostBasis) -> Self {
        self.cost = cost;
        self
    }
}

impl From<ServiceKey> for CallContext {
    fn from(key: ServiceKey) -> Self {
        Self {
            key,
            cost: CostBasis::default(),
        }
    }
}

/// Runs provider calls through the breaker, the rate limiter and the retry
/// schedule.
///
/// For each execution:
/// 1. An open breaker fails the call immediately (`ApiError`, 503).
/// 2. Each attempt is admitted by the rate limiter. A denial becomes a
///    retryable `RateLimit` failure whose wait is the window's retry-after.
/// 3. Failures are classified, reported to the breaker and retried with
///    exponential backoff when retryable and attempts remain.
///
/// Every dispatched attempt is recorded in the limiter's usage counters.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    limiter: Arc<RateLimiter>,
    breakers: Arc<CircuitBreakerRegistry>,
    retry: RetryConfig,
    breaker: CircuitBreakerConfig,
}

impl RetryExecutor {
    /// Executor over shared registries with default policies.
    pub fn new(limiter: Arc<RateLimiter>, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self {
            limiter,
            breakers,
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Executor with fresh registries built from a configuration.
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self::new(
            Arc::new(config.rate_limiter()),
            Arc::new(CircuitBreakerRegistry::new()),
        )
        .with_retry_config(config.retry.clone())
        .with_breaker_config(config.circuit_breaker.clone())
    }

    /// Executor built from the layered on-disk configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load() -> ParleyResult<Self> {
        Ok(Self::from_config(&ParleyConfig::load()?))
    }

    /// Replace the default retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the default breaker thresholds.
    pub fn with_breaker_config(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Shared breaker registry.
    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Default retry policy.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Default breaker thresholds.
    pub fn breaker_config(&self) -> &CircuitBreakerConfig {
        &self.breaker
    }

    /// Run `operation` with retries, rate limiting and circuit breaking.
    ///
    /// `retry` and `breaker` override the executor's defaults for this call.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the last attempt, a circuit-open
    /// rejection, or a `RateLimit` error when no attempt could be admitted.
    #[instrument(skip_all, fields(key = %call.key()))]
    pub async fn execute_with_retry<T, E, F, Fut>(
        &self,
        call: &CallContext,
        operation: F,
        retry: Option<&RetryConfig>,
        breaker: Option<&CircuitBreakerConfig>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        self.run(call, operation, retry, breaker, None).await
    }

    /// Like [`execute_with_retry`](Self::execute_with_retry), abandoning the
    /// call as soon as `token` is cancelled.
    ///
    /// Cancellation interrupts backoff sleeps, rate-limit waits and the
    /// in-flight call, and is never reported to the breaker as a failure.
    ///
    /// # Errors
    ///
    /// As `execute_with_retry`, plus a `Cancelled` error when the token fires.
    #[instrument(skip_all, fields(key = %call.key()))]
    pub async fn execute_with_cancellation<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        call: &CallContext,
        operation: F,
        retry: Option<&RetryConfig>,
        breaker: Option<&CircuitBreakerConfig>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        self.run(call, operation, retry, breaker, Some(token)).await
    }

    async fn run<T, E, F, Fut>(
        &self,
        call: &CallContext,
        mut operation: F,
        retry: Option<&RetryConfig>,
        breaker: Option<&CircuitBreakerConfig>,
        token: Option<&CancellationToken>,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RawFailure>,
    {
        let retry = retry.unwrap_or(&self.retry);
        let breaker_config = breaker.unwrap_or(&self.breaker);
        let key = call.key();
        let context = RetryContext::new(key, retry.total_attempts());
        let metrics = ResilienceMetrics::get();

        if token.is_some_and(CancellationToken::is_cancelled) {
            return Err(ClassifiedError::cancelled(context));
        }

        if !self.breakers.is_allowed(key) {
            metrics.record_breaker_rejection(key);
            warn!("Circuit breaker open, rejecting call");
            return Err(ClassifiedError::circuit_open(context));
        }
        let probing = self
            .breakers
            .status(key)
            .is_some_and(|status| *status.state() == CircuitState::HalfOpen);

        let estimated_cost = self.limiter.estimate_cost(key, call.cost());
        debug!(estimated_cost, attempts = retry.total_attempts(), "Executing");

        let schedule = BackoffSchedule::new(retry);
        let override_next = schedule.override_handle();
        let delays = schedule.inspect(|delay| metrics.record_backoff(key, *delay));

        let attempt = AtomicU32::new(0);
        let last_error: Mutex<Option<String>> = Mutex::new(None);

        let limiter = self.limiter.as_ref();
        let breakers = self.breakers.as_ref();
        let attempt_counter = &attempt;
        let last_error_cell = &last_error;
        let operation = &mut operation;
        let attempt_context = context.clone();

        let retry_loop = Retry::spawn(delays, move || {
            let index = attempt_counter.fetch_add(1, Ordering::SeqCst);
            let mut ctx = attempt_context.clone().with_attempt(index + 1);
            if let Some(message) = last_error_cell.lock().clone() {
                ctx = ctx.with_last_error(message);
            }
            let is_last = ctx.is_last_attempt();

            let pending = match limiter.check_and_reserve(key, estimated_cost) {
                Admission::Allowed => Ok(operation()),
                Admission::Denied {
                    retry_after_secs,
                    reason,
                } => Err((retry_after_secs, reason)),
            };
            let override_next = Arc::clone(&override_next);

            async move {
                let call = match pending {
                    Ok(call) => call,
                    Err((retry_after_secs, reason)) => {
                        metrics.record_rate_limit_denial(key, &reason.to_string());
                        let err = ClassifiedError::rate_limited(
                            reason.to_string(),
                            Some(retry_after_secs),
                            ctx,
                        );
                        *last_error_cell.lock() = Some(err.message.clone());
                        if is_last {
                            // Never dispatched, so hand the half-open lease back
                            if probing {
                                breakers.release_probe(key);
                            }
                            warn!(%reason, "Rate limited on final attempt");
                            return Err(RetryError::Permanent(err));
                        }
                        debug!(retry_after_secs, %reason, "Rate limited, waiting for window reset");
                        *override_next.lock() = Some(Duration::from_secs(retry_after_secs));
                        return Err(RetryError::Transient {
                            err,
                            retry_after: None,
                        });
                    }
                };

                match call.await {
                    Ok(value) => {
                        breakers.on_success(key);
                        limiter.record_usage(key, estimated_cost, true);
                        metrics.record_attempt(key, true);
                        Ok(value)
                    }
                    Err(raw) => {
                        let elapsed_ms = ctx.elapsed().num_milliseconds();
                        let err = classify(raw, &ctx).with_context(ctx);
                        breakers.on_failure(key, breaker_config);
                        limiter.record_usage(key, estimated_cost, false);
                        metrics.record_attempt(key, false);
                        metrics.record_failure(key, err.kind);
                        *last_error_cell.lock() = Some(err.message.clone());

                        if !err.retryable {
                            warn!(error = %err, elapsed_ms, "Permanent failure, not retrying");
                            Err(RetryError::Permanent(err))
                        } else if is_last {
                            warn!(error = %err, elapsed_ms, "Retries exhausted");
                            Err(RetryError::Permanent(err))
                        } else {
                            warn!(error = %err, elapsed_ms, "Transient failure, will retry");
                            Err(RetryError::Transient {
                                err,
                                retry_after: None,
                            })
                        }
                    }
                }
            }
        });

        let Some(token) = token else {
            return retry_loop.await;
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                if probing {
                    breakers.release_probe(key);
                }
                let mut ctx = context.with_attempt(attempt.load(Ordering::SeqCst));
                if let Some(message) = last_error.lock().clone() {
                    ctx = ctx.with_last_error(message);
                }
                warn!("Call cancelled");
                Err(ClassifiedError::cancelled(ctx))
            }
            result = retry_loop => result,
        }
    }
}
