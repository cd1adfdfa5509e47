//! Unclassified failures as reported by provider calls.

use crate::ClassifiedError;

/// Transport-level fault observed before any HTTP status was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportFault {
    /// Peer reset or aborted the connection
    #[display("connection reset")]
    ConnectionReset,
    /// Host name could not be resolved
    #[display("DNS failure")]
    Dns,
    /// Connection refused
    #[display("connection refused")]
    Refused,
    /// Deadline elapsed while waiting on the peer
    #[display("timed out")]
    TimedOut,
    /// Any other transport fault
    #[display("transport failure")]
    Other,
}

/// A failure as raised by a provider call, before classification.
///
/// Provider clients report failures in whatever shape their transport gives
/// them. This enum fixes the shape the classifier works from: an optional
/// HTTP status, an optional transport fault and a message.
///
/// # Examples
///
/// ```
/// use parley_error::RawFailure;
///
/// let raw = RawFailure::http(429, "Too Many Requests");
/// assert_eq!(raw.status(), Some(429));
///
/// let raw: RawFailure = "socket hang up".into();
/// assert_eq!(raw.status(), None);
/// ```
#[derive(Debug, Clone, derive_more::Display)]
pub enum RawFailure {
    /// Already classified; passes through the classifier untouched
    #[display("{}", _0)]
    Classified(Box<ClassifiedError>),
    /// Provider answered with an error status
    #[display("HTTP {}: {}", status, message)]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },
    /// Transport failed before a status was received
    #[display("{}: {}", fault, message)]
    Transport {
        /// Fault category
        fault: TransportFault,
        /// Underlying error message
        message: String,
    },
    /// Free-form error message
    #[display("{}", _0)]
    Message(String),
}

impl RawFailure {
    /// HTTP failure with a status code.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Transport failure.
    pub fn transport(fault: TransportFault, message: impl Into<String>) -> Self {
        Self::Transport {
            fault,
            message: message.into(),
        }
    }

    /// HTTP status, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RawFailure::Classified(err) => err.status_code,
            RawFailure::Http { status, .. } => Some(*status),
            RawFailure::Transport { .. } | RawFailure::Message(_) => None,
        }
    }

    /// Failure message.
    pub fn message(&self) -> &str {
        match self {
            RawFailure::Classified(err) => &err.message,
            RawFailure::Http { message, .. } => message,
            RawFailure::Transport { message, .. } => message,
            RawFailure::Message(message) => message,
        }
    }
}

impl std::error::Error for RawFailure {}

impl From<ClassifiedError> for RawFailure {
    fn from(err: ClassifiedError) -> Self {
        Self::Classified(Box::new(err))
    }
}

impl From<String> for RawFailure {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RawFailure {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<std::io::Error> for RawFailure {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let fault = match err.kind() {
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                TransportFault::ConnectionReset
            }
            ErrorKind::ConnectionRefused => TransportFault::Refused,
            ErrorKind::TimedOut => TransportFault::TimedOut,
            ErrorKind::NotConnected | ErrorKind::AddrNotAvailable | ErrorKind::UnexpectedEof => {
                TransportFault::Other
            }
            _ => return Self::Message(err.to_string()),
        };
        Self::transport(fault, err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for RawFailure {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::transport(TransportFault::TimedOut, err.to_string())
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for RawFailure {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else if err.is_timeout() {
            Self::transport(TransportFault::TimedOut, err.to_string())
        } else if err.is_connect() {
            Self::transport(TransportFault::Refused, err.to_string())
        } else if err.is_request() || err.is_body() {
            Self::transport(TransportFault::Other, err.to_string())
        } else {
            Self::Message(err.to_string())
        }
    }
}
