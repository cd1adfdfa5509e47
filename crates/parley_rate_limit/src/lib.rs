//! Rate limiting and cost budgets.
//!
//! This crate provides per-endpoint admission control for calls to
//! rate-limited, cost-metered provider endpoints, together with the
//! TOML-based configuration for the whole resilience layer.
//!
//! ## Admission model
//!
//! Each configured [`ServiceKey`](parley_core::ServiceKey) owns a fixed
//! window with a request budget and an optional cost budget. Cost is an
//! abstract unit produced by a pluggable per-endpoint [`CostEstimator`], so a
//! single request-count limiter doubles as a coarse cost governor.
//! Unconfigured endpoints are always admitted.

mod config;
mod cost;
mod limiter;
mod usage;

pub use config::{EndpointLimit, MaintenanceConfig, OrchestratorConfig, ParleyConfig};
pub use cost::{CostEstimator, CostModel};
pub use limiter::{Admission, DenialReason, RateLimiter, WindowSnapshot};
pub use usage::UsageStats;
