//! Capability façade with provider ordering and fallback.

use crate::{AvailabilityCache, normalize};
use futures::future::{BoxFuture, join_all};
use parley_core::{Capability, CapabilityResponse, CostBasis, RetryContext, UsageMetadata};
use parley_error::{
    ClassifiedError, OrchestratorError, OrchestratorErrorKind, OrchestratorResult, ParleyResult,
    RawFailure, classify,
};
use parley_interface::{
    CallOptions, ChatMessage, Conversation, ConversationOptions, ConversationRequest,
    GrammarCheck, GrammarOptions, GrammarRequest, ProviderDriver, ProviderOutput, SpeechOptions,
    SpeechRequest, SpeechSynthesis, Transcription, TranscriptionOptions, TranscriptionRequest,
    Translation, TranslationOptions, TranslationRequest,
};
use parley_rate_limit::{OrchestratorConfig, ParleyConfig};
use parley_resilience::{CallContext, RetryExecutor};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Routes capability calls to providers with retries and fallback.
///
/// # Example
///
/// ```no_run
/// use parley_interface::ConversationOptions;
/// use parley_orchestrator::ProviderOrchestrator;
/// # use parley_interface::Conversation;
/// # use std::sync::Arc;
///
/// # async fn example(openai: Arc<impl Conversation + 'static>, gemini: Arc<impl Conversation + 'static>)
/// # -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = ProviderOrchestrator::load()?
///     .with_conversation(openai)
///     .with_conversation(gemini)
///     .build();
///
/// let reply = orchestrator
///     .converse("¿Cómo se dice 'library'?", &ConversationOptions::default())
///     .await?;
/// println!("{} answered: {}", reply.provider_used(), reply.text());
/// # Ok(())
/// # }
/// ```
pub struct ProviderOrchestrator {
    executor: RetryExecutor,
    config: OrchestratorConfig,
    availability: AvailabilityCache,
    drivers: Vec<Arc<dyn ProviderDriver>>,
    conversation: Vec<Arc<dyn Conversation>>,
    translation: Vec<Arc<dyn Translation>>,
    grammar: Vec<Arc<dyn GrammarCheck>>,
    speech: Vec<Arc<dyn SpeechSynthesis>>,
    transcription: Vec<Arc<dyn Transcription>>,
}

impl std::fmt::Debug for ProviderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<&str> = self.drivers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderOrchestrator")
            .field("config", &self.config)
            .field("providers", &providers)
            .finish()
    }
}

/// Builder registering providers per capability.
pub struct ProviderOrchestratorBuilder {
    executor: RetryExecutor,
    config: OrchestratorConfig,
    drivers: Vec<Arc<dyn ProviderDriver>>,
    conversation: Vec<Arc<dyn Conversation>>,
    translation: Vec<Arc<dyn Translation>>,
    grammar: Vec<Arc<dyn GrammarCheck>>,
    speech: Vec<Arc<dyn SpeechSynthesis>>,
    transcription: Vec<Arc<dyn Transcription>>,
}

impl ProviderOrchestratorBuilder {
    /// Replace the selection settings.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a conversation provider.
    pub fn with_conversation<P: Conversation + 'static>(mut self, provider: Arc<P>) -> Self {
        self.register(provider.clone());
        self.conversation.push(provider);
        self
    }

    /// Register a translation provider.
    pub fn with_translation<P: Translation + 'static>(mut self, provider: Arc<P>) -> Self {
        self.register(provider.clone());
        self.translation.push(provider);
        self
    }

    /// Register a grammar provider.
    pub fn with_grammar<P: GrammarCheck + 'static>(mut self, provider: Arc<P>) -> Self {
        self.register(provider.clone());
        self.grammar.push(provider);
        self
    }

    /// Register a speech synthesis provider.
    pub fn with_speech<P: SpeechSynthesis + 'static>(mut self, provider: Arc<P>) -> Self {
        self.register(provider.clone());
        self.speech.push(provider);
        self
    }

    /// Register a transcription provider.
    pub fn with_transcription<P: Transcription + 'static>(mut self, provider: Arc<P>) -> Self {
        self.register(provider.clone());
        self.transcription.push(provider);
        self
    }

    fn register(&mut self, driver: Arc<dyn ProviderDriver>) {
        if !self.drivers.iter().any(|d| d.name() == driver.name()) {
            self.drivers.push(driver);
        }
    }

    /// Finish building.
    pub fn build(self) -> ProviderOrchestrator {
        let availability = AvailabilityCache::new(self.config.availability_ttl());
        ProviderOrchestrator {
            executor: self.executor,
            config: self.config,
            availability,
            drivers: self.drivers,
            conversation: self.conversation,
            translation: self.translation,
            grammar: self.grammar,
            speech: self.speech,
            transcription: self.transcription,
        }
    }
}

impl ProviderOrchestrator {
    /// Start building an orchestrator around `executor`.
    pub fn builder(executor: RetryExecutor) -> ProviderOrchestratorBuilder {
        ProviderOrchestratorBuilder {
            executor,
            config: OrchestratorConfig::default(),
            drivers: Vec::new(),
            conversation: Vec::new(),
            translation: Vec::new(),
            grammar: Vec::new(),
            speech: Vec::new(),
            transcription: Vec::new(),
        }
    }

    /// Builder wired from a configuration: executor, limits and selection.
    pub fn from_config(config: &ParleyConfig) -> ProviderOrchestratorBuilder {
        Self::builder(RetryExecutor::from_config(config)).with_config(config.orchestrator.clone())
    }

    /// Builder wired from the layered on-disk configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn load() -> ParleyResult<ProviderOrchestratorBuilder> {
        Ok(Self::from_config(&ParleyConfig::load()?))
    }

    /// Executor running every provider call.
    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    /// Cached availability results.
    pub fn availability(&self) -> &AvailabilityCache {
        &self.availability
    }

    /// Names of the providers registered for a capability, in registration order.
    pub fn providers_for(&self, capability: Capability) -> Vec<String> {
        fn names<P: ProviderDriver + ?Sized>(providers: &[Arc<P>]) -> Vec<String> {
            providers.iter().map(|p| p.name().to_string()).collect()
        }
        match capability {
            Capability::Conversation => names(&self.conversation),
            Capability::Translation => names(&self.translation),
            Capability::GrammarCheck => names(&self.grammar),
            Capability::SpeechSynthesis => names(&self.speech),
            Capability::Transcription => names(&self.transcription),
        }
    }

    /// Probe every registered provider, reusing results younger than the TTL.
    #[instrument(skip(self))]
    pub async fn check_availability(&self) -> HashMap<String, bool> {
        let probes = self.drivers.iter().map(|driver| async move {
            let available = self.availability.check(driver.as_ref()).await;
            (driver.name().to_string(), available)
        });
        join_all(probes).await.into_iter().collect()
    }

    /// Produce the next tutor turn for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns the provider's classified failure when it is the only one
    /// registered, otherwise `CapabilityUnavailable` once every provider
    /// has failed.
    #[instrument(skip(self, prompt, options))]
    pub async fn converse(
        &self,
        prompt: &str,
        options: &ConversationOptions,
    ) -> OrchestratorResult<CapabilityResponse> {
        let mut messages = Vec::with_capacity(options.history.len() + 2);
        if let Some(system) = &options.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.extend(options.history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        let request = Arc::new(ConversationRequest {
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        });
        let cost = request.cost_basis();

        self.dispatch(
            Capability::Conversation,
            &self.conversation,
            options,
            cost,
            |_| Ok(()),
            move |provider: Arc<dyn Conversation>| -> BoxFuture<'static, Result<ProviderOutput, RawFailure>> {
                let request = Arc::clone(&request);
                Box::pin(async move { provider.converse(&request).await.map(ProviderOutput::from) })
            },
        )
        .await
    }

    /// Translate `text` from one language to another.
    ///
    /// # Errors
    ///
    /// As [`converse`](Self::converse).
    #[instrument(skip(self, text, options))]
    pub async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        options: &TranslationOptions,
    ) -> OrchestratorResult<CapabilityResponse> {
        let request = Arc::new(TranslationRequest {
            text: text.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
        let cost = request.cost_basis();

        self.dispatch(
            Capability::Translation,
            &self.translation,
            options,
            cost,
            |_| Ok(()),
            move |provider: Arc<dyn Translation>| -> BoxFuture<'static, Result<ProviderOutput, RawFailure>> {
                let request = Arc::clone(&request);
                Box::pin(async move { provider.translate(&request).await.map(ProviderOutput::from) })
            },
        )
        .await
    }

    /// Check `text` for grammar issues; the response text is the corrected text.
    ///
    /// # Errors
    ///
    /// As [`converse`](Self::converse).
    #[instrument(skip(self, text, options))]
    pub async fn check_grammar(
        &self,
        text: &str,
        options: &GrammarOptions,
    ) -> OrchestratorResult<CapabilityResponse> {
        let request = Arc::new(GrammarRequest {
            text: text.to_string(),
            language: options.language.clone(),
        });
        let cost = request.cost_basis();

        self.dispatch(
            Capability::GrammarCheck,
            &self.grammar,
            options,
            cost,
            |_| Ok(()),
            move |provider: Arc<dyn GrammarCheck>| -> BoxFuture<'static, Result<ProviderOutput, RawFailure>> {
                let request = Arc::clone(&request);
                Box::pin(async move { provider.check_grammar(&request).await.map(ProviderOutput::from) })
            },
        )
        .await
    }

    /// Synthesize speech; the response text is base64 audio and the usage
    /// metadata carries its MIME type.
    ///
    /// # Errors
    ///
    /// As [`converse`](Self::converse).
    #[instrument(skip(self, text, options))]
    pub async fn synthesize_speech(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> OrchestratorResult<CapabilityResponse> {
        let request = Arc::new(SpeechRequest {
            text: text.to_string(),
            voice: options.voice.clone(),
            language: options.language.clone(),
            speed: options.speed,
        });
        let cost = request.cost_basis();

        self.dispatch(
            Capability::SpeechSynthesis,
            &self.speech,
            options,
            cost,
            |_| Ok(()),
            move |provider: Arc<dyn SpeechSynthesis>| -> BoxFuture<'static, Result<ProviderOutput, RawFailure>> {
                let request = Arc::clone(&request);
                Box::pin(async move {
                    let mut audio = provider.synthesize(&request).await?;
                    if audio.content_type.is_empty() {
                        audio.content_type = provider.output_format().to_string();
                    }
                    Ok(ProviderOutput::from(audio))
                })
            },
        )
        .await
    }

    /// Transcribe recorded audio.
    ///
    /// # Errors
    ///
    /// As [`converse`](Self::converse).
    #[instrument(skip(self, audio, options), fields(audio_bytes = audio.len()))]
    pub async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscriptionOptions,
    ) -> OrchestratorResult<CapabilityResponse> {
        let request = Arc::new(TranscriptionRequest {
            audio: audio.to_vec(),
            content_type: options.content_type.clone(),
            language: options.language.clone(),
        });
        let cost = request.cost_basis();
        let admitted = Arc::clone(&request);

        self.dispatch(
            Capability::Transcription,
            &self.transcription,
            options,
            cost,
            move |provider| provider.check_input(&admitted),
            move |provider: Arc<dyn Transcription>| -> BoxFuture<'static, Result<ProviderOutput, RawFailure>> {
                let request = Arc::clone(&request);
                Box::pin(async move { provider.transcribe(&request).await.map(ProviderOutput::from) })
            },
        )
        .await
    }

    /// Order providers: caller preference first, then the configured default
    /// order, then registration order; available providers ahead of
    /// unavailable ones after the preference.
    async fn order<P>(
        &self,
        capability: Capability,
        providers: &[Arc<P>],
        preferred: Option<&str>,
    ) -> Vec<Arc<P>>
    where
        P: ProviderDriver + ?Sized,
    {
        let defaults = self.config.order_for(capability);
        let rank = |provider: &Arc<P>| -> usize {
            defaults
                .iter()
                .position(|name| name == provider.name())
                .unwrap_or(defaults.len())
        };

        let mut ordered: Vec<Arc<P>> = providers.to_vec();
        // Stable: unlisted providers keep registration order
        ordered.sort_by_key(|provider| rank(provider));

        let mut head = Vec::new();
        if let Some(preferred) = preferred {
            if let Some(index) = ordered.iter().position(|p| p.name() == preferred) {
                head.push(ordered.remove(index));
            } else {
                warn!(preferred, %capability, "Preferred provider not registered, ignoring");
            }
        }

        let checks = ordered
            .iter()
            .map(|provider| self.availability.check(provider.as_ref()));
        let available = join_all(checks).await;

        let (up, down): (Vec<_>, Vec<_>) = ordered
            .into_iter()
            .zip(available)
            .partition(|(_, available)| *available);

        head.into_iter()
            .chain(up.into_iter().map(|(provider, _)| provider))
            .chain(down.into_iter().map(|(provider, _)| provider))
            .collect()
    }

    async fn dispatch<P, O, A, F>(
        &self,
        capability: Capability,
        providers: &[Arc<P>],
        options: &O,
        cost: CostBasis,
        admit: A,
        call: F,
    ) -> OrchestratorResult<CapabilityResponse>
    where
        P: ProviderDriver + ?Sized,
        O: CallOptions,
        A: Fn(&P) -> Result<(), RawFailure>,
        F: Fn(Arc<P>) -> BoxFuture<'static, Result<ProviderOutput, RawFailure>>,
    {
        let ordered = self
            .order(capability, providers, options.preferred_provider())
            .await;
        let order_names: Vec<&str> = ordered.iter().map(|p| p.name()).collect();
        debug!(%capability, order = ?order_names, "Provider order");

        let mut failures: Vec<ClassifiedError> = Vec::new();
        let mut tried: Vec<String> = Vec::new();

        for provider in &ordered {
            let name = provider.name().to_string();
            let call_context = CallContext::new(name.clone(), capability.endpoint()).with_cost(cost);

            // Rejected locally, before the limiter and breaker see it
            if let Err(raw) = admit(provider.as_ref()) {
                let err = classify(raw, &RetryContext::new(call_context.key(), 1));
                warn!(%capability, provider = %name, error = %err, "Provider cannot take this request, trying next");
                tried.push(name);
                failures.push(err);
                continue;
            }

            let estimated_cost = self
                .executor
                .limiter()
                .estimate_cost(call_context.key(), &cost);

            let operation = || call(Arc::clone(provider));
            let result = match options.cancellation() {
                Some(token) => {
                    self.executor
                        .execute_with_cancellation(
                            token,
                            &call_context,
                            operation,
                            options.retry(),
                            None,
                        )
                        .await
                }
                None => {
                    self.executor
                        .execute_with_retry(&call_context, operation, options.retry(), None)
                        .await
                }
            };

            match result {
                Ok(output) => {
                    if !tried.is_empty() {
                        info!(%capability, provider = %name, fallback_from = ?tried, "Served by fallback provider");
                    }
                    let usage = UsageMetadata {
                        provider: name,
                        fallback_from: tried,
                        estimated_cost,
                        ..Default::default()
                    };
                    return Ok(normalize(output, usage));
                }
                Err(err) if err.is_cancelled() => {
                    debug!(%capability, provider = %name, "Cancelled, abandoning fallback chain");
                    return Err(OrchestratorError::new(OrchestratorErrorKind::Provider(err)));
                }
                Err(err) => {
                    warn!(%capability, provider = %name, error = %err, "Provider failed, trying next");
                    tried.push(name);
                    failures.push(err);
                }
            }
        }

        if providers.len() == 1 && failures.len() == 1 {
            if let Some(err) = failures.pop() {
                return Err(OrchestratorError::new(OrchestratorErrorKind::Provider(err)));
            }
        }

        warn!(%capability, tried = ?tried, "Every provider failed");
        Err(OrchestratorError::new(
            OrchestratorErrorKind::CapabilityUnavailable {
                capability,
                failures,
            },
        ))
    }
}
