//! Trait definitions for the Parley provider layer.
//!
//! This crate provides the core driver trait every provider implements, one
//! capability trait per capability, and the request, option and output
//! types that flow through them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod options;
mod output;
mod request;
mod traits;

pub use options::{
    CallOptions, ConversationOptions, ConversationOptionsBuilder, GrammarOptions,
    GrammarOptionsBuilder, SpeechOptions, SpeechOptionsBuilder, TranscriptionOptions,
    TranscriptionOptionsBuilder, TranslationOptions, TranslationOptionsBuilder,
};
pub use output::{
    ChatCompletion, GrammarIssue, GrammarReport, ProviderOutput, SynthesizedAudio, Transcript,
    TranscriptSegment, TranslationOutput,
};
pub use request::{
    ChatMessage, ConversationRequest, GrammarRequest, Role, SpeechRequest, TranscriptionRequest,
    TranslationRequest,
};
pub use traits::{
    Conversation, GrammarCheck, ProviderDriver, SpeechSynthesis, Transcription, Translation,
};
