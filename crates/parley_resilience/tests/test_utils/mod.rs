//! Test utilities for resilience tests.
//!
//! This module provides a scripted provider call and helpers for building
//! executors over fresh registries.

pub mod scripted;

#[allow(unused_imports)]
pub use scripted::ScriptedCall;

use parley_core::{CircuitBreakerConfig, RetryConfig};
use parley_rate_limit::RateLimiter;
use parley_resilience::{CircuitBreakerRegistry, RetryExecutor};
use std::sync::Arc;

/// Executor over fresh registries with deterministic (jitter-free) retries.
#[allow(dead_code)]
pub fn executor(limiter: RateLimiter) -> RetryExecutor {
    RetryExecutor::new(Arc::new(limiter), Arc::new(CircuitBreakerRegistry::new()))
        .with_retry_config(RetryConfig::default().with_jitter(false))
        .with_breaker_config(CircuitBreakerConfig::default())
}
