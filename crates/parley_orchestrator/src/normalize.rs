//! Normalization of provider outputs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parley_core::{CapabilityResponse, UsageMetadata};
use parley_interface::ProviderOutput;

/// Collapse a provider output into a text response.
///
/// `usage` arrives with the provider, fallback chain and cost filled in;
/// token counts, content type and detected language are taken from the
/// output. Audio is base64-encoded, transcripts are joined segment by
/// segment and grammar reports yield their corrected text.
///
/// # Example
///
/// ```
/// use parley_core::UsageMetadata;
/// use parley_interface::{ProviderOutput, SynthesizedAudio};
/// use parley_orchestrator::normalize;
///
/// let output = ProviderOutput::from(SynthesizedAudio {
///     bytes: b"ID3".to_vec(),
///     content_type: "audio/mpeg".to_string(),
/// });
/// let usage = UsageMetadata {
///     provider: "openai".to_string(),
///     ..Default::default()
/// };
///
/// let response = normalize(output, usage);
/// assert_eq!(response.text(), "SUQz");
/// assert_eq!(
///     response.usage().as_ref().and_then(|u| u.content_type.as_deref()),
///     Some("audio/mpeg")
/// );
/// ```
pub fn normalize(output: ProviderOutput, mut usage: UsageMetadata) -> CapabilityResponse {
    let text = match output {
        ProviderOutput::Chat(chat) => {
            usage.prompt_tokens = chat.prompt_tokens;
            usage.completion_tokens = chat.completion_tokens;
            chat.text
        }
        ProviderOutput::Translation(translation) => {
            usage.detected_language = translation.detected_language;
            translation.text
        }
        ProviderOutput::Grammar(report) => report.corrected,
        ProviderOutput::Audio(audio) => {
            usage.content_type = Some(audio.content_type);
            STANDARD.encode(&audio.bytes)
        }
        ProviderOutput::Transcript(transcript) => {
            usage.detected_language = transcript.language;
            transcript
                .segments
                .iter()
                .map(|segment| segment.text.trim())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        }
    };

    let provider = usage.provider.clone();
    CapabilityResponse::new(text, provider, Some(usage))
}
