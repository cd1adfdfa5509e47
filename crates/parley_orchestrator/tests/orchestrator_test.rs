//! Tests for provider ordering, fallback and normalization.

mod test_utils;

use parley_core::{Capability, CircuitBreakerConfig, CostBasis, RetryConfig, ServiceKey};
use parley_error::{ClassifiedErrorKind, OrchestratorErrorKind, RawFailure};
use parley_interface::{
    ChatMessage, ConversationOptions, GrammarOptions, SpeechOptions, TranscriptionOptions,
    TranslationOptions,
};
use parley_orchestrator::ProviderOrchestrator;
use parley_rate_limit::OrchestratorConfig;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockProvider, executor};
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn test_fallback_provider_serves_response() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_error(
        "openai",
        RawFailure::http(503, "Service unavailable"),
    ));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let response = orchestrator
        .converse("Hola", &ConversationOptions::default())
        .await?;

    assert_eq!(response.provider_used(), "gemini");
    assert_eq!(response.text(), "gemini says: Hola");
    assert_eq!(openai.call_count(), 4, "primary retried to exhaustion");
    assert_eq!(gemini.call_count(), 1);

    let usage = response.usage().as_ref().expect("usage metadata");
    assert_eq!(usage.provider, "gemini");
    assert_eq!(usage.fallback_from, vec!["openai".to_string()]);
    assert_eq!(usage.prompt_tokens, Some(10));
    assert_eq!(usage.completion_tokens, Some(5));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_default_order_per_capability() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(gemini.clone())
        .with_conversation(openai.clone())
        .with_translation(openai.clone())
        .with_translation(gemini.clone())
        .build();

    let reply = orchestrator
        .converse("Hi", &ConversationOptions::default())
        .await?;
    assert_eq!(reply.provider_used(), "openai");

    let translated = orchestrator
        .translate("cat", "en", "es", &TranslationOptions::default())
        .await?;
    assert_eq!(translated.provider_used(), "gemini");
    assert_eq!(translated.text(), "[es] cat");
    assert_eq!(
        translated
            .usage()
            .as_ref()
            .and_then(|u| u.detected_language.as_deref()),
        Some("en")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_preferred_provider_goes_first() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let options = ConversationOptions::builder()
        .preferred_provider("gemini")
        .build()?;
    let reply = orchestrator.converse("Hi", &options).await?;

    assert_eq!(reply.provider_used(), "gemini");
    assert_eq!(openai.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_preference_is_ignored() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .build();

    let options = ConversationOptions::builder()
        .preferred_provider("mistral")
        .build()?;
    let reply = orchestrator.converse("Hi", &options).await?;
    assert_eq!(reply.provider_used(), "openai");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_provider_moves_to_back() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai").unavailable());
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let reply = orchestrator
        .converse("Hi", &ConversationOptions::default())
        .await?;

    assert_eq!(reply.provider_used(), "gemini");
    assert_eq!(openai.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_provider_still_tried_last() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai").unavailable());
    let gemini = Arc::new(MockProvider::new_error(
        "gemini",
        RawFailure::http(400, "Bad request"),
    ));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let reply = orchestrator
        .converse("Hi", &ConversationOptions::default())
        .await?;

    assert_eq!(reply.provider_used(), "openai");
    assert_eq!(gemini.call_count(), 1);
    assert_eq!(
        reply.usage().as_ref().map(|u| u.fallback_from.clone()),
        Some(vec!["gemini".to_string()])
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_all_providers_failing_is_capability_unavailable() {
    let openai = Arc::new(MockProvider::new_error(
        "openai",
        RawFailure::http(401, "Unauthorized"),
    ));
    let gemini = Arc::new(MockProvider::new_error(
        "gemini",
        RawFailure::http(403, "Forbidden"),
    ));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_grammar(openai.clone())
        .with_grammar(gemini.clone())
        .build();

    let err = orchestrator
        .check_grammar("I goed home", &GrammarOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_capability_unavailable());
    match &err.kind {
        OrchestratorErrorKind::CapabilityUnavailable {
            capability,
            failures,
        } => {
            assert_eq!(*capability, Capability::GrammarCheck);
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].provider(), "openai");
            assert_eq!(failures[1].provider(), "gemini");
            assert!(
                failures
                    .iter()
                    .all(|f| f.kind == ClassifiedErrorKind::Authentication)
            );
        }
        other => panic!("unexpected error kind: {:?}", other),
    }
    assert_eq!(openai.call_count(), 1);
    assert_eq!(gemini.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_single_provider_failure_surfaces_classified_error() {
    let openai = Arc::new(MockProvider::new_error(
        "openai",
        RawFailure::http(401, "Unauthorized"),
    ));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_speech(openai.clone())
        .build();

    let err = orchestrator
        .synthesize_speech("Hola", &SpeechOptions::default())
        .await
        .unwrap_err();

    assert!(!err.is_capability_unavailable());
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].kind, ClassifiedErrorKind::Authentication);
    assert_eq!(openai.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_registered_provider() {
    let orchestrator = ProviderOrchestrator::builder(executor()).build();

    let err = orchestrator
        .transcribe(b"RIFF", &TranscriptionOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_capability_unavailable());
    assert!(err.failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_open_breaker_falls_back_without_calling() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let executor = executor();
    let key = ServiceKey::new("openai", Capability::Conversation.endpoint());
    let breaker = CircuitBreakerConfig::default();
    for _ in 0..breaker.failure_threshold {
        executor.breakers().on_failure(&key, &breaker);
    }

    let orchestrator = ProviderOrchestrator::builder(executor)
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let reply = orchestrator
        .converse("Hi", &ConversationOptions::default())
        .await?;

    assert_eq!(reply.provider_used(), "gemini");
    assert_eq!(openai.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_fallback_chain() {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_translation(openai.clone())
        .with_translation(gemini.clone())
        .build();

    let token = CancellationToken::new();
    token.cancel();
    let options = TranslationOptions::builder()
        .cancellation(token)
        .build()
        .unwrap();

    let err = orchestrator
        .translate("cat", "en", "fr", &options)
        .await
        .unwrap_err();

    assert!(!err.is_capability_unavailable());
    assert!(err.failures()[0].is_cancelled());
    assert_eq!(openai.call_count() + gemini.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retry_override_from_options() {
    let openai = Arc::new(MockProvider::new_error(
        "openai",
        RawFailure::http(500, "Internal error"),
    ));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .build();

    let options = ConversationOptions::builder()
        .retry(RetryConfig::no_retry())
        .build()
        .unwrap();
    let err = orchestrator.converse("Hi", &options).await.unwrap_err();

    assert_eq!(err.failures()[0].kind, ClassifiedErrorKind::ApiError);
    assert_eq!(openai.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_conversation_history_and_system_prompt() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .build();

    let options = ConversationOptions::builder()
        .system_prompt("Reply in Spanish.")
        .history(vec![
            ChatMessage::user("Hello"),
            ChatMessage::assistant("¡Hola!"),
        ])
        .build()?;
    let reply = orchestrator.converse("How are you?", &options).await?;

    assert_eq!(reply.text(), "openai says: How are you?");
    // system + two history turns + prompt
    assert_eq!(
        reply.usage().as_ref().and_then(|u| u.prompt_tokens),
        Some(40)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_speech_is_base64_with_content_type() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_speech(openai.clone())
        .build();

    let reply = orchestrator
        .synthesize_speech("Hola", &SpeechOptions::default())
        .await?;

    assert_eq!(reply.text(), "SG9sYQ==");
    assert_eq!(
        reply.usage().as_ref().and_then(|u| u.content_type.as_deref()),
        Some("audio/mpeg")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_transcript_segments_joined() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_transcription(openai.clone())
        .build();

    let options = TranscriptionOptions::builder()
        .content_type("audio/wav")
        .build()?;
    let reply = orchestrator.transcribe(&[0u8; 1024], &options).await?;

    assert_eq!(reply.text(), "Buenos días");
    assert_eq!(
        reply
            .usage()
            .as_ref()
            .and_then(|u| u.detected_language.as_deref()),
        Some("es")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_audio_format_falls_back() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai").with_input_formats(&["audio/mpeg"]));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_transcription(openai.clone())
        .with_transcription(gemini.clone())
        .build();

    let options = TranscriptionOptions::builder()
        .content_type("Audio/WAV; codecs=1")
        .build()?;
    let reply = orchestrator.transcribe(&[0u8; 512], &options).await?;

    assert_eq!(reply.provider_used(), "gemini");
    assert_eq!(openai.call_count(), 0);
    assert_eq!(gemini.call_count(), 1);
    assert_eq!(
        reply.usage().as_ref().map(|u| u.fallback_from.clone()),
        Some(vec!["openai".to_string()])
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_oversized_audio_rejected_before_dispatch() {
    let openai = Arc::new(MockProvider::new_success("openai").with_max_audio_bytes(256));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_transcription(openai.clone())
        .build();

    let options = TranscriptionOptions::builder()
        .content_type("audio/wav")
        .build()
        .unwrap();
    let err = orchestrator
        .transcribe(&[0u8; 1024], &options)
        .await
        .unwrap_err();

    assert!(!err.is_capability_unavailable());
    let failure = &err.failures()[0];
    assert_eq!(failure.kind, ClassifiedErrorKind::ApiError);
    assert_eq!(failure.status_code, Some(413));
    assert!(!failure.retryable);
    assert_eq!(failure.provider(), "openai");
    assert_eq!(openai.call_count(), 0);

    let key = ServiceKey::new("openai", Capability::Transcription.endpoint());
    assert!(orchestrator.executor().breakers().status(&key).is_none());
    assert!(orchestrator.executor().limiter().usage(&key).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_format_reports_unsupported_media() {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_transcription(openai.clone())
        .with_transcription(gemini.clone())
        .build();

    let options = TranscriptionOptions::builder()
        .content_type("audio/flac")
        .build()
        .unwrap();
    let err = orchestrator
        .transcribe(&[0u8; 64], &options)
        .await
        .unwrap_err();

    assert!(err.is_capability_unavailable());
    assert_eq!(err.failures().len(), 2);
    assert!(err.failures().iter().all(|f| f.status_code == Some(415)));
    assert_eq!(openai.call_count() + gemini.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_untagged_speech_uses_provider_output_format() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai").with_untagged_audio());
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_speech(openai.clone())
        .build();

    let reply = orchestrator
        .synthesize_speech("Hola", &SpeechOptions::default())
        .await?;

    assert_eq!(
        reply.usage().as_ref().and_then(|u| u.content_type.as_deref()),
        Some("audio/ogg")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_grammar_returns_corrected_text() -> anyhow::Result<()> {
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_grammar(gemini.clone())
        .build();

    let reply = orchestrator
        .check_grammar("I goed home", &GrammarOptions::default())
        .await?;
    assert_eq!(reply.text(), "I went home");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_availability_cached_for_ttl() {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini").unavailable());
    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_conversation(openai.clone())
        .with_translation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    let first = orchestrator.check_availability().await;
    assert_eq!(first.len(), 2);
    assert_eq!(first["openai"], true);
    assert_eq!(first["gemini"], false);

    gemini.set_available(true);
    let cached = orchestrator.check_availability().await;
    assert_eq!(cached["gemini"], false);
    assert_eq!(gemini.probe_count(), 1);
    assert_eq!(openai.probe_count(), 1, "shared provider probed once");

    tokio::time::advance(Duration::from_secs(300)).await;
    let refreshed = orchestrator.check_availability().await;
    assert_eq!(refreshed["gemini"], true);
    assert_eq!(gemini.probe_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_configured_order_and_ttl() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let gemini = Arc::new(MockProvider::new_success("gemini"));
    let mut config = OrchestratorConfig::default();
    config.availability_ttl_ms = 1_000;
    config.preferences.insert(
        Capability::Conversation.to_string(),
        vec!["gemini".to_string(), "openai".to_string()],
    );

    let orchestrator = ProviderOrchestrator::builder(executor())
        .with_config(config)
        .with_conversation(openai.clone())
        .with_conversation(gemini.clone())
        .build();

    assert_eq!(orchestrator.availability().ttl(), Duration::from_secs(1));
    let reply = orchestrator
        .converse("Hi", &ConversationOptions::default())
        .await?;
    assert_eq!(reply.provider_used(), "gemini");
    assert_eq!(
        orchestrator.providers_for(Capability::Conversation),
        vec!["openai".to_string(), "gemini".to_string()]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_usage_reports_estimated_cost() -> anyhow::Result<()> {
    let openai = Arc::new(MockProvider::new_success("openai"));
    let executor = executor();
    let key = ServiceKey::new("openai", "translation");
    executor
        .limiter()
        .set_estimator(key.clone(), |basis: &CostBasis| basis.characters as f64 * 2.0);

    let orchestrator = ProviderOrchestrator::builder(executor)
        .with_translation(openai.clone())
        .build();

    let reply = orchestrator
        .translate("gato", "es", "en", &TranslationOptions::default())
        .await?;

    assert_eq!(
        reply.usage().as_ref().map(|u| u.estimated_cost),
        Some(8.0)
    );
    let stats = orchestrator.executor().limiter().usage(&key).unwrap();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.cost, 8.0);
    Ok(())
}
