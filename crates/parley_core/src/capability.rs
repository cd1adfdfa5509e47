//! Capabilities exposed by the provider orchestrator.

use serde::{Deserialize, Serialize};

/// A capability a provider can implement.
///
/// The string form doubles as the endpoint half of a
/// [`ServiceKey`](crate::ServiceKey), so rate limits and breakers are scoped
/// per provider per capability.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Free-form dialogue with a tutor persona.
    Conversation,
    /// Text translation between two languages.
    Translation,
    /// Grammar checking and correction.
    #[serde(rename = "grammar")]
    #[strum(serialize = "grammar")]
    GrammarCheck,
    /// Text-to-speech.
    #[serde(rename = "speech")]
    #[strum(serialize = "speech")]
    SpeechSynthesis,
    /// Speech-to-text.
    Transcription,
}

impl Capability {
    /// Endpoint name used for rate limits and circuit breakers.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Capability::Conversation => "conversation",
            Capability::Translation => "translation",
            Capability::GrammarCheck => "grammar",
            Capability::SpeechSynthesis => "speech",
            Capability::Transcription => "transcription",
        }
    }
}
