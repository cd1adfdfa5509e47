//! Provider + endpoint identity.

use serde::{Deserialize, Serialize};

/// Composite identity of an upstream service: which provider, which endpoint.
///
/// Every piece of per-service state (rate-limit windows, usage counters,
/// circuit breakers) is keyed by a `ServiceKey`.
///
/// # Examples
///
/// ```
/// use parley_core::ServiceKey;
///
/// let key = ServiceKey::new("openai", "conversation");
/// assert_eq!(key.provider(), "openai");
/// assert_eq!(key.to_string(), "openai/conversation");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{}/{}", provider, endpoint)]
pub struct ServiceKey {
    provider: String,
    endpoint: String,
}

impl ServiceKey {
    /// Create a key from a provider name and an endpoint name.
    pub fn new(provider: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Provider name (e.g., "openai", "gemini").
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Endpoint name (e.g., "conversation", "transcription").
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<P, E> From<(P, E)> for ServiceKey
where
    P: Into<String>,
    E: Into<String>,
{
    fn from((provider, endpoint): (P, E)) -> Self {
        Self::new(provider, endpoint)
    }
}
