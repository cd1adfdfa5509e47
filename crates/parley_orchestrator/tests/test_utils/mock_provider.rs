//! Mock provider implementing every capability.

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_error::RawFailure;
use parley_interface::{
    ChatCompletion, Conversation, ConversationRequest, GrammarCheck, GrammarIssue, GrammarReport,
    GrammarRequest, ProviderDriver, SpeechRequest, SpeechSynthesis, SynthesizedAudio, Transcript,
    TranscriptSegment, Transcription, TranscriptionRequest, Translation, TranslationOutput,
    TranslationRequest,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Scripted provider for deterministic orchestration tests.
pub struct MockProvider {
    name: String,
    script: Mutex<VecDeque<RawFailure>>,
    always_fail: Option<RawFailure>,
    available: AtomicBool,
    calls: AtomicU32,
    probes: AtomicU32,
    input_formats: Vec<&'static str>,
    max_audio_bytes: usize,
    untagged_audio: bool,
}

#[allow(dead_code)]
impl MockProvider {
    /// Provider that always succeeds.
    pub fn new_success(name: &str) -> Self {
        Self::build(name, Vec::new(), None)
    }

    /// Provider that always fails with `failure`.
    pub fn new_error(name: &str, failure: RawFailure) -> Self {
        Self::build(name, Vec::new(), Some(failure))
    }

    /// Provider that fails `failures` times, then succeeds.
    pub fn new_fail_then_succeed(name: &str, failures: usize, failure: RawFailure) -> Self {
        let script = (0..failures).map(|_| failure.clone()).collect();
        Self::build(name, script, None)
    }

    fn build(name: &str, script: Vec<RawFailure>, always_fail: Option<RawFailure>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            always_fail,
            available: AtomicBool::new(true),
            calls: AtomicU32::new(0),
            probes: AtomicU32::new(0),
            input_formats: vec!["audio/mpeg", "audio/wav", "audio/webm"],
            max_audio_bytes: 1024 * 1024,
            untagged_audio: false,
        }
    }

    /// Restrict the accepted transcription formats.
    pub fn with_input_formats(mut self, formats: &[&'static str]) -> Self {
        self.input_formats = formats.to_vec();
        self
    }

    /// Cap the transcription payload size.
    pub fn with_max_audio_bytes(mut self, max: usize) -> Self {
        self.max_audio_bytes = max;
        self
    }

    /// Return synthesized audio without a MIME type.
    pub fn with_untagged_audio(mut self) -> Self {
        self.untagged_audio = true;
        self
    }

    /// Mark the provider as failing its availability probe.
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Change what the next probe reports.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of capability calls received.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of availability probes received.
    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<(), RawFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.script.lock().pop_front() {
            return Err(failure);
        }
        match &self.always_fail {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderDriver for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Conversation for MockProvider {
    async fn converse(&self, request: &ConversationRequest) -> Result<ChatCompletion, RawFailure> {
        self.next_outcome()?;
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatCompletion {
            text: format!("{} says: {}", self.name, last),
            prompt_tokens: Some(request.messages.len() as u64 * 10),
            completion_tokens: Some(5),
        })
    }
}

#[async_trait]
impl Translation for MockProvider {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationOutput, RawFailure> {
        self.next_outcome()?;
        Ok(TranslationOutput {
            text: format!("[{}] {}", request.to, request.text),
            detected_language: Some(request.from.clone()),
            notes: vec!["literal".to_string()],
        })
    }
}

#[async_trait]
impl GrammarCheck for MockProvider {
    async fn check_grammar(&self, request: &GrammarRequest) -> Result<GrammarReport, RawFailure> {
        self.next_outcome()?;
        let corrected = request.text.replace("goed", "went");
        let issues = request
            .text
            .find("goed")
            .map(|offset| GrammarIssue {
                message: "Irregular past tense".to_string(),
                offset,
                length: 4,
                suggestion: Some("went".to_string()),
            })
            .into_iter()
            .collect();
        Ok(GrammarReport { corrected, issues })
    }
}

#[async_trait]
impl SpeechSynthesis for MockProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, RawFailure> {
        self.next_outcome()?;
        Ok(SynthesizedAudio {
            bytes: request.text.as_bytes().to_vec(),
            content_type: if self.untagged_audio {
                String::new()
            } else {
                "audio/mpeg".to_string()
            },
        })
    }

    fn output_format(&self) -> &'static str {
        "audio/ogg"
    }
}

#[async_trait]
impl Transcription for MockProvider {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript, RawFailure> {
        self.next_outcome()?;
        Ok(Transcript {
            segments: vec![
                TranscriptSegment {
                    text: " Buenos ".to_string(),
                    start_ms: 0,
                    end_ms: 400,
                },
                TranscriptSegment {
                    text: "días".to_string(),
                    start_ms: 400,
                    end_ms: request.audio.len() as u64,
                },
            ],
            language: Some("es".to_string()),
        })
    }

    fn supported_input_formats(&self) -> &[&'static str] {
        &self.input_formats
    }

    fn max_audio_bytes(&self) -> usize {
        self.max_audio_bytes
    }
}
