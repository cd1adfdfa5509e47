//! Top-level error wrapper types.

use crate::{ClassifiedError, ConfigError, OrchestratorError};

/// Workspace-wide error kinds.
///
/// # Examples
///
/// ```
/// use parley_error::{ConfigError, ParleyError};
///
/// let err: ParleyError = ConfigError::new("Missing retry section").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ParleyErrorKind {
    /// Classified provider failure
    #[from(ClassifiedError)]
    Classified(ClassifiedError),
    /// Orchestration failure
    #[from(OrchestratorError)]
    Orchestrator(OrchestratorError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Parley error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Parley Error: {}", _0)]
pub struct ParleyError(Box<ParleyErrorKind>);

impl ParleyError {
    /// Create a new error from a kind.
    pub fn new(kind: ParleyErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ParleyErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to ParleyErrorKind
impl<T> From<T> for ParleyError
where
    T: Into<ParleyErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Parley operations.
pub type ParleyResult<T> = std::result::Result<T, ParleyError>;
