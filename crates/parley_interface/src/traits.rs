//! Trait definitions for providers and their capabilities.

use crate::{
    ChatCompletion, ConversationRequest, GrammarReport, GrammarRequest, SpeechRequest,
    SynthesizedAudio, Transcript, TranscriptionRequest, TranslationOutput, TranslationRequest,
};
use async_trait::async_trait;
use parley_error::RawFailure;

/// Core trait that all providers must implement.
///
/// Capabilities are exposed through the optional traits below. Calls report
/// failures as [`RawFailure`]; classification and retries happen above this
/// layer.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Provider name (e.g., "openai", "gemini"). Used as the provider half of
    /// every service key.
    fn name(&self) -> &str;

    /// Cheap reachability check used by availability probing.
    async fn probe(&self) -> bool {
        true
    }
}

/// Providers that can hold a tutoring conversation.
#[async_trait]
pub trait Conversation: ProviderDriver {
    /// Produce the next assistant turn.
    async fn converse(&self, request: &ConversationRequest) -> Result<ChatCompletion, RawFailure>;
}

/// Providers that translate text.
#[async_trait]
pub trait Translation: ProviderDriver {
    /// Translate `request.text` into the target language.
    async fn translate(&self, request: &TranslationRequest)
    -> Result<TranslationOutput, RawFailure>;
}

/// Providers that check grammar.
#[async_trait]
pub trait GrammarCheck: ProviderDriver {
    /// Report grammar issues and a corrected text.
    async fn check_grammar(&self, request: &GrammarRequest) -> Result<GrammarReport, RawFailure>;
}

/// Providers that turn text into speech.
#[async_trait]
pub trait SpeechSynthesis: ProviderDriver {
    /// Synthesize audio for `request.text`.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, RawFailure>;

    /// Audio format produced (MIME type).
    fn output_format(&self) -> &'static str {
        "audio/mpeg"
    }
}

/// Providers that turn speech into text.
#[async_trait]
pub trait Transcription: ProviderDriver {
    /// Transcribe the audio payload.
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript, RawFailure>;

    /// Supported audio input formats (MIME types).
    fn supported_input_formats(&self) -> &[&'static str] {
        &["audio/mpeg", "audio/wav", "audio/webm", "audio/m4a"]
    }

    /// Maximum audio size in bytes.
    fn max_audio_bytes(&self) -> usize {
        25 * 1024 * 1024
    }

    /// Reject payloads this provider cannot take, before any network call.
    ///
    /// Formats compare on the base MIME type, ignoring parameters and case.
    /// An empty format list accepts anything.
    fn check_input(&self, request: &TranscriptionRequest) -> Result<(), RawFailure> {
        let base = request
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let formats = self.supported_input_formats();
        if !formats.is_empty() && !formats.iter().any(|f| f.eq_ignore_ascii_case(base)) {
            return Err(RawFailure::http(
                415,
                format!("{} does not accept {base} audio", self.name()),
            ));
        }

        let limit = self.max_audio_bytes();
        if request.audio.len() > limit {
            return Err(RawFailure::http(
                413,
                format!(
                    "audio payload of {} bytes exceeds the {limit} byte limit of {}",
                    request.audio.len(),
                    self.name()
                ),
            ));
        }
        Ok(())
    }
}
