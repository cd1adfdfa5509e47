//! Retry execution and circuit breaking.
//!
//! This crate wraps every provider call in the resilience pipeline:
//!
//! 1. The [`CircuitBreakerRegistry`] short-circuits calls to a service that
//!    has recently failed repeatedly.
//! 2. The [`RateLimiter`](parley_rate_limit::RateLimiter) admits or refuses
//!    each attempt against the endpoint's request and cost budget.
//! 3. Failures are classified and retried with exponential backoff and
//!    jitter when the classification says that is safe.
//!
//! The registries are explicit objects shared through `Arc`, so tests build
//! fresh ones and applications construct them once at start-up.
//!
//! # Example
//!
//! ```no_run
//! use parley_error::RawFailure;
//! use parley_resilience::{CallContext, RetryExecutor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryExecutor::load()?;
//! let call = CallContext::new("openai", "conversation");
//!
//! let reply = executor
//!     .execute_with_retry(&call, || async { Ok::<_, RawFailure>("Bonjour!") }, None, None)
//!     .await?;
//! assert_eq!(reply, "Bonjour!");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod circuit_breaker;
mod executor;
mod maintenance;
mod metrics;

pub use backoff::{BackoffSchedule, jittered};
pub use circuit_breaker::{CircuitBreakerRegistry, CircuitState, CircuitStatus};
pub use executor::{CallContext, RetryExecutor};
pub use maintenance::{SweepReport, spawn_maintenance, sweep_once};
pub use metrics::ResilienceMetrics;
