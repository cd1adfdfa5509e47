//! Provider-agnostic capability responses.

use serde::{Deserialize, Serialize};

/// Usage details attached to a normalized response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Provider that produced the response.
    pub provider: String,
    /// Providers that were tried and failed before this one, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_from: Vec<String>,
    /// Prompt tokens reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    /// Cost units reserved against the endpoint's budget.
    pub estimated_cost: f64,
    /// MIME type when the payload is not plain text (e.g., synthesized audio).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Source language detected by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
}

/// Normalized response returned by every orchestrator capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct CapabilityResponse {
    /// Response text (base64 for audio payloads).
    text: String,
    /// Provider that produced the response.
    provider_used: String,
    /// Usage details, if any were collected.
    usage: Option<UsageMetadata>,
}

impl CapabilityResponse {
    /// Create a normalized response.
    pub fn new(
        text: impl Into<String>,
        provider_used: impl Into<String>,
        usage: Option<UsageMetadata>,
    ) -> Self {
        Self {
            text: text.into(),
            provider_used: provider_used.into(),
            usage,
        }
    }

    /// Consume the response, returning the text.
    pub fn into_text(self) -> String {
        self.text
    }
}
