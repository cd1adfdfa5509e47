//! Parley - resilient access to language-tutoring AI providers
//!
//! Parley wraps every outbound provider call in admission control, retries
//! with exponential backoff, and per-service circuit breaking, then routes
//! capability requests across providers with automatic fallback.
//!
//! # Features
//!
//! - **Error classification**: Any upstream failure mapped onto a small taxonomy
//! - **Rate limiting**: Fixed windows on request count and estimated cost
//! - **Circuit breaking**: Per provider-endpoint breakers with half-open probes
//! - **Retries**: Exponential backoff with jitter and cancellation
//! - **Orchestration**: Conversation, translation, grammar, speech and
//!   transcription with ordered provider fallback
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parley::{ConversationOptions, ProviderOrchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = ProviderOrchestrator::load()?
//!         .with_conversation(Arc::new(my_openai_driver()))
//!         .with_conversation(Arc::new(my_gemini_driver()))
//!         .build();
//!
//!     let reply = orchestrator
//!         .converse("¿Cómo estás?", &ConversationOptions::default())
//!         .await?;
//!     println!("{}: {}", reply.provider_used(), reply.text());
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - OpenTelemetry tracing bridge with stdout export
//! - `reqwest` - Classify `reqwest::Error` values directly
//!
//! # Architecture
//!
//! - `parley_core` - Service keys, policies and response types
//! - `parley_error` - Error taxonomy and classifier
//! - `parley_interface` - Provider capability traits and call options
//! - `parley_rate_limit` - Configuration and sliding-window admission
//! - `parley_resilience` - Circuit breakers, backoff and the retry executor
//! - `parley_orchestrator` - Provider ordering, fallback and normalization
//!
//! This crate re-exports everything for convenience.

pub use parley_core::*;
pub use parley_error::*;
pub use parley_interface::*;
pub use parley_orchestrator::*;
pub use parley_rate_limit::*;
pub use parley_resilience::*;

#[cfg(feature = "observability")]
mod observability;

#[cfg(feature = "observability")]
pub use observability::{
    ObservabilityConfig, init_observability, init_observability_with_config,
    shutdown_observability,
};
