//! Test utilities for facade tests.

use async_trait::async_trait;
use parley::{
    ChatCompletion, Conversation, ConversationRequest, ProviderDriver, RawFailure, Translation,
    TranslationOutput, TranslationRequest,
};
use std::sync::atomic::{AtomicU32, Ordering};

/// Provider echoing the last user turn.
pub struct EchoProvider {
    name: String,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl EchoProvider {
    /// Echo provider reporting `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of capability calls received.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderDriver for EchoProvider {
    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Conversation for EchoProvider {
    async fn converse(&self, request: &ConversationRequest) -> Result<ChatCompletion, RawFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatCompletion::new(last))
    }
}

#[async_trait]
impl Translation for EchoProvider {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationOutput, RawFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranslationOutput {
            text: request.text.clone(),
            detected_language: None,
            notes: Vec::new(),
        })
    }
}
