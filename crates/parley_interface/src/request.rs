//! Requests handed to capability traits.

use parley_core::CostBasis;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Instructions framing the conversation
    System,
    /// The learner
    User,
    /// The tutor
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who spoke
    pub role: Role,
    /// What was said
    pub content: String,
}

impl ChatMessage {
    /// Turn spoken by the learner.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Turn spoken by the tutor.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// System instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A conversation turn to complete.
///
/// # Examples
///
/// ```
/// use parley_interface::{ChatMessage, ConversationRequest};
///
/// let request = ConversationRequest {
///     messages: vec![ChatMessage::user("¿Qué tal?")],
///     max_tokens: Some(200),
///     temperature: None,
/// };
/// assert_eq!(request.cost_basis().messages, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationRequest {
    /// Full conversation, oldest first, ending with the new user turn
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
}

impl ConversationRequest {
    /// Size of the request for cost estimation.
    pub fn cost_basis(&self) -> CostBasis {
        let characters = self.messages.iter().map(|m| m.content.chars().count()).sum();
        CostBasis::conversation(self.messages.len(), characters)
    }
}

/// Text to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Source text
    pub text: String,
    /// Language of the source text (e.g., "en")
    pub from: String,
    /// Language to translate into (e.g., "es")
    pub to: String,
}

impl TranslationRequest {
    /// Size of the request for cost estimation.
    pub fn cost_basis(&self) -> CostBasis {
        CostBasis::characters(self.text.chars().count())
    }
}

/// Text to check for grammar issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRequest {
    /// Text written by the learner
    pub text: String,
    /// Language of the text, if known
    pub language: Option<String>,
}

impl GrammarRequest {
    /// Size of the request for cost estimation.
    pub fn cost_basis(&self) -> CostBasis {
        CostBasis::characters(self.text.chars().count())
    }
}

/// Text to speak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to synthesize
    pub text: String,
    /// Voice identifier, provider-specific
    pub voice: Option<String>,
    /// Language of the text
    pub language: Option<String>,
    /// Playback speed multiplier
    pub speed: Option<f32>,
}

impl SpeechRequest {
    /// Size of the request for cost estimation.
    pub fn cost_basis(&self) -> CostBasis {
        CostBasis::characters(self.text.chars().count())
    }
}

/// Audio to transcribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    /// Raw audio bytes
    pub audio: Vec<u8>,
    /// MIME type of the audio
    pub content_type: String,
    /// Spoken language, if known
    pub language: Option<String>,
}

impl TranscriptionRequest {
    /// Size of the request for cost estimation.
    pub fn cost_basis(&self) -> CostBasis {
        CostBasis::audio(self.audio.len())
    }
}
