//! Test utilities for orchestrator tests.
//!
//! This module provides a mock provider implementing every capability and
//! helpers for building orchestrators over fresh registries.

pub mod mock_provider;

#[allow(unused_imports)]
pub use mock_provider::MockProvider;

use parley_core::RetryConfig;
use parley_rate_limit::RateLimiter;
use parley_resilience::{CircuitBreakerRegistry, RetryExecutor};
use std::sync::Arc;

/// Executor over fresh registries with jitter-free retries.
#[allow(dead_code)]
pub fn executor() -> RetryExecutor {
    RetryExecutor::new(
        Arc::new(RateLimiter::unlimited()),
        Arc::new(CircuitBreakerRegistry::new()),
    )
    .with_retry_config(RetryConfig::default().with_jitter(false))
}
