//! Capability routing and provider fallback.
//!
//! The [`ProviderOrchestrator`] exposes one method per capability. Each call
//! orders the registered providers, runs the first through the
//! [`RetryExecutor`](parley_resilience::RetryExecutor) and falls back to the
//! next provider (once each) when a classified failure propagates. Outputs
//! are normalized into a [`CapabilityResponse`](parley_core::CapabilityResponse).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod availability;
mod normalize;
mod orchestrator;

pub use availability::AvailabilityCache;
pub use normalize::normalize;
pub use orchestrator::{ProviderOrchestrator, ProviderOrchestratorBuilder};
