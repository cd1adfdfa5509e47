//! Heterogeneous provider outputs.

use serde::{Deserialize, Serialize};

/// Assistant turn produced by a conversation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Generated reply
    pub text: String,
    /// Tokens consumed by the prompt, if reported
    pub prompt_tokens: Option<u64>,
    /// Tokens generated, if reported
    pub completion_tokens: Option<u64>,
}

impl ChatCompletion {
    /// Completion without token accounting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}

/// Translated text with optional analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationOutput {
    /// Translated text
    pub text: String,
    /// Language the provider detected in the source
    pub detected_language: Option<String>,
    /// Notes on idioms, register or literal meaning
    pub notes: Vec<String>,
}

/// One grammar problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    /// Explanation for the learner
    pub message: String,
    /// Character offset of the problem
    pub offset: usize,
    /// Length of the problem span in characters
    pub length: usize,
    /// Suggested replacement
    pub suggestion: Option<String>,
}

/// Result of a grammar check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrammarReport {
    /// Text with every suggestion applied
    pub corrected: String,
    /// Problems found
    pub issues: Vec<GrammarIssue>,
}

/// Synthesized speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedAudio {
    /// Encoded audio
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub content_type: String,
}

/// A timed piece of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Recognized text
    pub text: String,
    /// Segment start in milliseconds
    pub start_ms: u64,
    /// Segment end in milliseconds
    pub end_ms: u64,
}

/// Recognized speech.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Segments in playback order
    pub segments: Vec<TranscriptSegment>,
    /// Language the provider detected
    pub language: Option<String>,
}

/// Any capability output, ready for normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
pub enum ProviderOutput {
    /// Conversation reply
    Chat(ChatCompletion),
    /// Translation
    Translation(TranslationOutput),
    /// Grammar check
    Grammar(GrammarReport),
    /// Speech synthesis
    Audio(SynthesizedAudio),
    /// Transcription
    Transcript(Transcript),
}
