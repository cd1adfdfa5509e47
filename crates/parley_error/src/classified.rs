//! Classified, retry-annotated errors.

use parley_core::RetryContext;
use serde::Serialize;

/// Failure categories understood by the retry executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display)]
pub enum ClassifiedErrorKind {
    /// Connection reset, DNS failure or other transport fault
    #[display("Network")]
    Network,
    /// Upstream or local rate limit
    #[display("RateLimit")]
    RateLimit,
    /// Provider returned an error status
    #[display("ApiError")]
    ApiError,
    /// Credentials rejected
    #[display("Authentication")]
    Authentication,
    /// Provider call timed out
    #[display("Timeout")]
    Timeout,
    /// Anything the classifier could not place
    #[display("Unknown")]
    Unknown,
    /// Execution abandoned through a cancellation token
    #[display("Cancelled")]
    Cancelled,
}

/// A fully classified failure with the retry context it occurred in.
///
/// This is the terminal artifact surfaced to callers once retries are
/// exhausted or the failure is not worth retrying.
///
/// # Examples
///
/// ```
/// use parley_core::{RetryContext, ServiceKey};
/// use parley_error::{ClassifiedError, ClassifiedErrorKind};
///
/// let ctx = RetryContext::new(&ServiceKey::new("gemini", "translation"), 4);
/// let err = ClassifiedError::circuit_open(ctx);
/// assert_eq!(err.kind, ClassifiedErrorKind::ApiError);
/// assert_eq!(err.status_code, Some(503));
/// assert!(!err.retryable);
/// ```
#[derive(Debug, Clone, Serialize, derive_more::Display, derive_more::Error)]
#[display("{} error: {} at line {} in {}", kind, message, line, file)]
pub struct ClassifiedError {
    /// Failure category
    pub kind: ClassifiedErrorKind,
    /// Human-readable description
    pub message: String,
    /// HTTP status, when the failure carried one
    pub status_code: Option<u16>,
    /// Whether the executor may re-attempt the call
    pub retryable: bool,
    /// Suggested wait before a manual retry, in seconds
    pub retry_after_secs: Option<u64>,
    /// Execution context at the time of failure
    pub context: RetryContext,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl ClassifiedError {
    /// Create a classified error with automatic location tracking.
    #[track_caller]
    pub fn new(
        kind: ClassifiedErrorKind,
        message: impl Into<String>,
        status_code: Option<u16>,
        retryable: bool,
        context: RetryContext,
    ) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            status_code,
            retryable,
            retry_after_secs: None,
            context,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Rejection issued while the circuit breaker is open.
    ///
    /// Equivalent to an HTTP 503 and never retryable: the caller must not
    /// retry a short-circuited call on its own.
    #[track_caller]
    pub fn circuit_open(context: RetryContext) -> Self {
        let message = format!(
            "Circuit breaker open for {}/{}",
            context.provider(),
            context.endpoint()
        );
        Self::new(
            ClassifiedErrorKind::ApiError,
            message,
            Some(503),
            false,
            context,
        )
    }

    /// Local rate-limit denial.
    #[track_caller]
    pub fn rate_limited(
        reason: impl Into<String>,
        retry_after_secs: Option<u64>,
        context: RetryContext,
    ) -> Self {
        let mut err = Self::new(
            ClassifiedErrorKind::RateLimit,
            reason,
            None,
            true,
            context,
        );
        err.retry_after_secs = retry_after_secs;
        err
    }

    /// Execution abandoned through a cancellation token.
    #[track_caller]
    pub fn cancelled(context: RetryContext) -> Self {
        Self::new(
            ClassifiedErrorKind::Cancelled,
            "Operation cancelled",
            None,
            false,
            context,
        )
    }

    /// Replace the context, keeping everything else.
    pub fn with_context(mut self, context: RetryContext) -> Self {
        self.context = context;
        self
    }

    /// Provider the failure belongs to.
    pub fn provider(&self) -> &str {
        self.context.provider()
    }

    /// Whether this error came from a cancellation token.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ClassifiedErrorKind::Cancelled
    }
}
