//! Core data types for the Parley resilience layer.
//!
//! This crate provides the foundation types shared by the classifier, the
//! rate limiter, the circuit breaker registry, the retry executor and the
//! provider orchestrator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod breaker_config;
mod capability;
mod context;
mod cost;
mod response;
mod retry_config;
mod service_key;

pub use breaker_config::CircuitBreakerConfig;
pub use capability::Capability;
pub use context::RetryContext;
pub use cost::CostBasis;
pub use response::{CapabilityResponse, UsageMetadata};
pub use retry_config::RetryConfig;
pub use service_key::ServiceKey;
