//! Provider orchestration errors.

use crate::ClassifiedError;
use parley_core::Capability;

/// Orchestration failure conditions.
#[derive(Debug, Clone, derive_more::Display)]
pub enum OrchestratorErrorKind {
    /// The only provider for the capability failed (or the call was cancelled)
    #[display("{}", _0)]
    Provider(ClassifiedError),

    /// Every provider implementing the capability was tried and failed
    #[display("Capability unavailable: {}", capability)]
    CapabilityUnavailable {
        /// Capability that could not be served
        capability: Capability,
        /// Terminal error from each provider, in the order they were tried
        failures: Vec<ClassifiedError>,
    },
}

/// Orchestrator error with location tracking.
///
/// # Examples
///
/// ```
/// use parley_core::Capability;
/// use parley_error::{OrchestratorError, OrchestratorErrorKind};
///
/// let err = OrchestratorError::new(OrchestratorErrorKind::CapabilityUnavailable {
///     capability: Capability::Translation,
///     failures: Vec::new(),
/// });
/// assert!(err.is_capability_unavailable());
/// assert!(err.to_string().contains("translation"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Orchestrator Error: {} at {}:{}", kind, file, line)]
pub struct OrchestratorError {
    /// The specific error kind
    pub kind: OrchestratorErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl OrchestratorError {
    /// Create a new orchestrator error.
    #[track_caller]
    pub fn new(kind: OrchestratorErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Whether every provider for the capability has been exhausted.
    pub fn is_capability_unavailable(&self) -> bool {
        matches!(
            self.kind,
            OrchestratorErrorKind::CapabilityUnavailable { .. }
        )
    }

    /// Per-provider failures behind this error, oldest first.
    pub fn failures(&self) -> &[ClassifiedError] {
        match &self.kind {
            OrchestratorErrorKind::Provider(err) => std::slice::from_ref(err),
            OrchestratorErrorKind::CapabilityUnavailable { failures, .. } => failures,
        }
    }
}

impl From<ClassifiedError> for OrchestratorError {
    #[track_caller]
    fn from(err: ClassifiedError) -> Self {
        Self::new(OrchestratorErrorKind::Provider(err))
    }
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
