//! Per-call options accepted by the orchestrator.

use crate::ChatMessage;
use derive_builder::Builder;
use parley_core::RetryConfig;
use tokio_util::sync::CancellationToken;

/// Options every orchestrated call understands.
pub trait CallOptions {
    /// Provider to try first, overriding the default order.
    fn preferred_provider(&self) -> Option<&str>;

    /// Token that abandons the call, including any remaining fallbacks.
    fn cancellation(&self) -> Option<&CancellationToken>;

    /// Retry policy overriding the executor default.
    fn retry(&self) -> Option<&RetryConfig>;
}

macro_rules! impl_call_options {
    ($($options:ty),+ $(,)?) => {
        $(
            impl CallOptions for $options {
                fn preferred_provider(&self) -> Option<&str> {
                    self.preferred_provider.as_deref()
                }

                fn cancellation(&self) -> Option<&CancellationToken> {
                    self.cancellation.as_ref()
                }

                fn retry(&self) -> Option<&RetryConfig> {
                    self.retry.as_ref()
                }
            }
        )+
    };
}

impl_call_options!(
    ConversationOptions,
    TranslationOptions,
    GrammarOptions,
    SpeechOptions,
    TranscriptionOptions,
);

/// Options for a conversation turn.
///
/// # Examples
///
/// ```
/// use parley_interface::{ChatMessage, ConversationOptions};
///
/// let options = ConversationOptions::builder()
///     .preferred_provider("gemini")
///     .system_prompt("You are a patient Spanish tutor.")
///     .history(vec![ChatMessage::user("Hola"), ChatMessage::assistant("¡Hola!")])
///     .build()
///     .unwrap();
///
/// assert_eq!(options.preferred_provider.as_deref(), Some("gemini"));
/// assert_eq!(options.history.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct ConversationOptions {
    /// Provider to try first
    #[builder(setter(into, strip_option))]
    pub preferred_provider: Option<String>,
    /// Tutor persona and instructions
    #[builder(setter(into, strip_option))]
    pub system_prompt: Option<String>,
    /// Earlier turns, oldest first
    pub history: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    #[builder(setter(strip_option))]
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    #[builder(setter(strip_option))]
    pub temperature: Option<f32>,
    /// Retry policy override
    #[builder(setter(strip_option))]
    pub retry: Option<RetryConfig>,
    /// Abandons the call when cancelled
    #[builder(setter(strip_option))]
    pub cancellation: Option<CancellationToken>,
}

impl ConversationOptions {
    /// Create a builder.
    pub fn builder() -> ConversationOptionsBuilder {
        ConversationOptionsBuilder::default()
    }
}

/// Options for a translation.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct TranslationOptions {
    /// Provider to try first
    #[builder(setter(into, strip_option))]
    pub preferred_provider: Option<String>,
    /// Retry policy override
    #[builder(setter(strip_option))]
    pub retry: Option<RetryConfig>,
    /// Abandons the call when cancelled
    #[builder(setter(strip_option))]
    pub cancellation: Option<CancellationToken>,
}

impl TranslationOptions {
    /// Create a builder.
    pub fn builder() -> TranslationOptionsBuilder {
        TranslationOptionsBuilder::default()
    }
}

/// Options for a grammar check.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct GrammarOptions {
    /// Provider to try first
    #[builder(setter(into, strip_option))]
    pub preferred_provider: Option<String>,
    /// Language of the text, if known
    #[builder(setter(into, strip_option))]
    pub language: Option<String>,
    /// Retry policy override
    #[builder(setter(strip_option))]
    pub retry: Option<RetryConfig>,
    /// Abandons the call when cancelled
    #[builder(setter(strip_option))]
    pub cancellation: Option<CancellationToken>,
}

impl GrammarOptions {
    /// Create a builder.
    pub fn builder() -> GrammarOptionsBuilder {
        GrammarOptionsBuilder::default()
    }
}

/// Options for speech synthesis.
#[derive(Debug, Clone, Default, Builder)]
#[builder(default)]
pub struct SpeechOptions {
    /// Provider to try first
    #[builder(setter(into, strip_option))]
    pub preferred_provider: Option<String>,
    /// Voice identifier, provider-specific
    #[builder(setter(into, strip_option))]
    pub voice: Option<String>,
    /// Language of the text
    #[builder(setter(into, strip_option))]
    pub language: Option<String>,
    /// Playback speed multiplier
    #[builder(setter(strip_option))]
    pub speed: Option<f32>,
    /// Retry policy override
    #[builder(setter(strip_option))]
    pub retry: Option<RetryConfig>,
    /// Abandons the call when cancelled
    #[builder(setter(strip_option))]
    pub cancellation: Option<CancellationToken>,
}

impl SpeechOptions {
    /// Create a builder.
    pub fn builder() -> SpeechOptionsBuilder {
        SpeechOptionsBuilder::default()
    }
}

/// Options for transcription.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct TranscriptionOptions {
    /// Provider to try first
    #[builder(setter(into, strip_option))]
    pub preferred_provider: Option<String>,
    /// MIME type of the audio
    #[builder(setter(into))]
    pub content_type: String,
    /// Spoken language, if known
    #[builder(setter(into, strip_option))]
    pub language: Option<String>,
    /// Retry policy override
    #[builder(setter(strip_option))]
    pub retry: Option<RetryConfig>,
    /// Abandons the call when cancelled
    #[builder(setter(strip_option))]
    pub cancellation: Option<CancellationToken>,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            content_type: "audio/webm".to_string(),
            language: None,
            retry: None,
            cancellation: None,
        }
    }
}

impl TranscriptionOptions {
    /// Create a builder.
    pub fn builder() -> TranscriptionOptionsBuilder {
        TranscriptionOptionsBuilder::default()
    }
}
