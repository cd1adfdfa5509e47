//! Maps raw failures onto the retry-safe taxonomy.

use crate::{ClassifiedError, ClassifiedErrorKind, RawFailure, TransportFault};
use parley_core::RetryContext;

/// Message fragments that indicate a transport-level failure.
const NETWORK_INDICATORS: &[&str] = &[
    "connection reset",
    "econnreset",
    "econnrefused",
    "dns",
    "enotfound",
    "getaddrinfo",
    "socket hang up",
    "network",
    "timeout",
    "connection",
];

/// Classify a raw failure.
///
/// Pure function. Rules are applied in order and the first match wins:
///
/// 1. Already classified: returned unchanged.
/// 2. Transport fault or network wording: `Network`, retryable.
/// 3. Status 429 or "rate limit": `RateLimit`, retryable.
/// 4. Status 401/403, "unauthorized" or "forbidden": `Authentication`.
/// 5. Status 5xx: `ApiError`, retryable.
/// 6. Status 4xx: `ApiError`.
/// 7. Timed-out transport or "timeout": `Timeout`, retryable.
/// 8. Anything else: `Unknown`, never retried.
///
/// A [`TransportFault::TimedOut`] fault skips the structural part of rule 2
/// and lands on rule 7 unless its message reads like a network failure.
///
/// # Examples
///
/// ```
/// use parley_core::{RetryContext, ServiceKey};
/// use parley_error::{ClassifiedErrorKind, RawFailure, classify};
///
/// let ctx = RetryContext::new(&ServiceKey::new("openai", "conversation"), 1);
/// let err = classify(RawFailure::http(401, "Invalid API key"), &ctx);
/// assert_eq!(err.kind, ClassifiedErrorKind::Authentication);
/// assert!(!err.retryable);
///
/// // Classifying a classified error is a no-op.
/// let again = classify(err.clone(), &ctx);
/// assert_eq!(again.kind, err.kind);
/// ```
#[track_caller]
pub fn classify(raw: impl Into<RawFailure>, context: &RetryContext) -> ClassifiedError {
    let (status, fault, message) = match raw.into() {
        RawFailure::Classified(err) => return *err,
        RawFailure::Http { status, message } => (Some(status), None, message),
        RawFailure::Transport { fault, message } => (None, Some(fault), message),
        RawFailure::Message(message) => (None, None, message),
    };
    let lower = message.to_lowercase();

    let (kind, retryable) = if is_network(fault, &lower) {
        (ClassifiedErrorKind::Network, true)
    } else if status == Some(429) || lower.contains("rate limit") {
        (ClassifiedErrorKind::RateLimit, true)
    } else if matches!(status, Some(401 | 403))
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
    {
        (ClassifiedErrorKind::Authentication, false)
    } else if matches!(status, Some(500..=599)) {
        (ClassifiedErrorKind::ApiError, true)
    } else if matches!(status, Some(400..=499)) {
        (ClassifiedErrorKind::ApiError, false)
    } else if fault == Some(TransportFault::TimedOut) || lower.contains("timeout") {
        (ClassifiedErrorKind::Timeout, true)
    } else {
        (ClassifiedErrorKind::Unknown, false)
    };

    let message = if message.is_empty() {
        match (status, fault) {
            (Some(status), _) => format!("HTTP {}", status),
            (None, Some(fault)) => fault.to_string(),
            (None, None) => kind.to_string(),
        }
    } else {
        message
    };

    ClassifiedError::new(kind, message, status, retryable, context.clone())
}

fn is_network(fault: Option<TransportFault>, lower: &str) -> bool {
    let structural = matches!(fault, Some(f) if f != TransportFault::TimedOut);
    structural
        || NETWORK_INDICATORS
            .iter()
            .any(|indicator| lower.contains(indicator))
}
