//! Error types for the Parley resilience layer.
//!
//! This crate provides the failure taxonomy shared across the workspace and
//! the classifier that maps arbitrary upstream failures onto it.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use parley_core::{RetryContext, ServiceKey};
//! use parley_error::{ClassifiedErrorKind, RawFailure, classify};
//!
//! let ctx = RetryContext::new(&ServiceKey::new("openai", "conversation"), 4);
//! let err = classify(RawFailure::http(503, "Service unavailable"), &ctx);
//! assert_eq!(err.kind, ClassifiedErrorKind::ApiError);
//! assert!(err.retryable);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classified;
mod classifier;
mod config;
mod error;
mod orchestrator;
mod raw;

pub use classified::{ClassifiedError, ClassifiedErrorKind};
pub use classifier::classify;
pub use config::ConfigError;
pub use error::{ParleyError, ParleyErrorKind, ParleyResult};
pub use orchestrator::{OrchestratorError, OrchestratorErrorKind, OrchestratorResult};
pub use raw::{RawFailure, TransportFault};
