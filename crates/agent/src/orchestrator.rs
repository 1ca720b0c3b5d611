//! Shopping pipeline
//!
//! Drives one inbound message through the step table in [`crate::step`]:
//! load the session, resolve the shopper's language, transcribe voice notes,
//! classify, run the intent branch and assemble exactly one response.
//! Adapters are injected as trait objects so the pipeline can be exercised
//! with fakes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indic_commerce_config::constants::messages;
use indic_commerce_config::{PaymentsConfig, PipelineConfig, TimeoutConfig};
use indic_commerce_core::{
    ConversationTurn, InboundMessage, Intent, Language, LanguageModel, ProductIndex, Response,
    SessionStore, SpeechSynthesizer, Transcriber, Translator, UserSession,
};

use crate::assembler::ResponseAssembler;
use crate::classifier::IntentClassifier;
use crate::handlers::BranchHandlers;
use crate::state::PipelineState;
use crate::step::{transition, PipelineStep, StepOutcome, MAX_STEPS};
use crate::{bounded, AgentError};

/// External capabilities the pipeline talks to
#[derive(Clone)]
pub struct PipelineAdapters {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub catalog: Arc<dyn ProductIndex>,
    /// JSON-mode model used for intent classification
    pub classifier: Arc<dyn LanguageModel>,
    /// Model used for cart and general-info replies
    pub responder: Arc<dyn LanguageModel>,
    pub sessions: Arc<dyn SessionStore>,
}

/// What happened during one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub intent: Option<Intent>,
    pub confidence: f32,
    pub language: Language,
    /// Steps in the order they ran, ending with `Assemble`
    pub steps: Vec<PipelineStep>,
    /// Internal failure description; never shown to the shopper
    pub error_message: Option<String>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn visited(&self, step: PipelineStep) -> bool {
        self.steps.contains(&step)
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

pub struct ShoppingPipeline {
    transcriber: Arc<dyn Transcriber>,
    sessions: Arc<dyn SessionStore>,
    classifier: IntentClassifier,
    handlers: BranchHandlers,
    assembler: ResponseAssembler,
    default_language: Language,
    timeouts: TimeoutConfig,
}

impl ShoppingPipeline {
    pub fn new(adapters: PipelineAdapters, config: &PipelineConfig, payments: &PaymentsConfig) -> Self {
        let working_language = configured_language("working_language", &config.working_language);
        let default_language = configured_language("default_language", &config.default_language);

        tracing::info!(
            catalog = adapters.catalog.len(),
            sessions = adapters.sessions.backend_name(),
            classifier = adapters.classifier.model_name(),
            responder = adapters.responder.model_name(),
            stt = adapters.transcriber.model_name(),
            tts = adapters.synthesizer.model_name(),
            "Shopping pipeline ready"
        );

        Self {
            classifier: IntentClassifier::new(adapters.classifier, config.timeouts.classification()),
            handlers: BranchHandlers::new(
                adapters.responder,
                adapters.catalog,
                adapters.sessions.clone(),
                config,
                payments.checkout_base_url.clone(),
            ),
            assembler: ResponseAssembler::new(
                adapters.translator,
                adapters.synthesizer,
                working_language,
                config.timeouts.clone(),
            ),
            transcriber: adapters.transcriber,
            sessions: adapters.sessions,
            default_language,
            timeouts: config.timeouts.clone(),
        }
    }

    /// Handle one inbound message; always yields a well-formed response
    pub async fn handle(&self, message: &InboundMessage) -> Response {
        self.handle_with_report(message).await.0
    }

    /// Like [`handle`](Self::handle), plus a report of the run
    pub async fn handle_with_report(&self, message: &InboundMessage) -> (Response, RunReport) {
        let started = Instant::now();
        let mut state = PipelineState::new(message, self.default_language);
        let mut steps = Vec::with_capacity(8);
        let mut step = PipelineStep::Start;

        while !step.is_terminal() {
            if steps.len() >= MAX_STEPS {
                tracing::error!(steps = ?steps, "Pipeline step limit reached");
                state = state.with_error(AgentError::StepLimit(MAX_STEPS));
                break;
            }
            steps.push(step);

            let (next_state, outcome) = self.run_step(step, message, state).await;
            state = next_state;
            let next = transition(step, outcome);
            tracing::debug!(step = %step, outcome = ?outcome, next = %next, "Step finished");
            step = next;
        }
        steps.push(PipelineStep::Assemble);

        let response = self.assembler.assemble(&state).await;
        if !state.has_error() {
            self.remember_exchange(&state).await;
        }

        let report = RunReport {
            intent: state.intent,
            confidence: state.confidence,
            language: state.user_language,
            steps,
            error_message: state.error_message,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            intent = report.intent.map(|i| i.as_str()).unwrap_or("none"),
            confidence = report.confidence,
            language = %report.language,
            steps = report.steps.len(),
            voice = response.has_voice(),
            failed = report.is_error(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Run complete"
        );

        (response, report)
    }

    async fn run_step(
        &self,
        step: PipelineStep,
        message: &InboundMessage,
        state: PipelineState,
    ) -> (PipelineState, StepOutcome) {
        match step {
            PipelineStep::Start => self.start(message, state).await,
            PipelineStep::SpeechToText => self.speech_to_text(message, state).await,
            PipelineStep::IdentifyIntent => self.identify_intent(state).await,
            PipelineStep::SearchProducts => {
                let products = self.handlers.search_products(&state).await;
                (state.with_candidates(products), StepOutcome::Done)
            },
            PipelineStep::GenerateProductResponse => {
                let text = self.handlers.product_response(&state).await;
                (state.with_reply(text), StepOutcome::Done)
            },
            PipelineStep::HandleCartUpdate => match self.handlers.cart_update(&state).await {
                Ok((text, cart)) => (state.with_cart(cart).with_reply(text), StepOutcome::Done),
                Err(e) => (state.with_error(AgentError::step(step, e)), StepOutcome::Failed),
            },
            PipelineStep::HandleSummarizeCart => {
                let text = BranchHandlers::summarize_cart(&state.session.cart);
                (state.with_reply(text), StepOutcome::Done)
            },
            PipelineStep::HandleInitiatePayment => {
                let text = self
                    .handlers
                    .initiate_payment(&state.session.cart, &state.sender_id);
                (state.with_reply(text), StepOutcome::Done)
            },
            PipelineStep::HandleGeneralInfo => match self.handlers.general_info(&state).await {
                Ok(text) => (state.with_reply(text), StepOutcome::Done),
                Err(e) => (state.with_error(AgentError::step(step, e)), StepOutcome::Failed),
            },
            PipelineStep::ErrorHandler => {
                tracing::error!(
                    sender = %state.sender_id,
                    intent = state.intent.map(|i| i.as_str()).unwrap_or("none"),
                    error = state.error_message.as_deref().unwrap_or("unknown"),
                    "Run failed, replying with apology"
                );
                (state.with_reply(messages::APOLOGY), StepOutcome::Done)
            },
            PipelineStep::Assemble => (state, StepOutcome::Done),
        }
    }

    /// Load the session and, for text, settle the shopper's language
    async fn start(&self, message: &InboundMessage, state: PipelineState) -> (PipelineState, StepOutcome) {
        let session = match bounded(
            "session",
            self.timeouts.session(),
            self.sessions.get(&state.sender_id),
        )
        .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(sender = %state.sender_id, error = %e, "Session load failed, using empty session");
                UserSession::default()
            },
        };
        let state = state.with_session(session);

        if message.is_audio() {
            return (state, StepOutcome::Audio);
        }

        let declared = declared_language(message);
        let language = declared
            .or(state.session.preferred_language)
            .unwrap_or(self.default_language);
        if let Some(language) = declared {
            self.remember_language(&state, language).await;
        }
        (state.with_language(language), StepOutcome::Text)
    }

    async fn speech_to_text(
        &self,
        message: &InboundMessage,
        state: PipelineState,
    ) -> (PipelineState, StepOutcome) {
        let Some(audio) = message.audio_ref() else {
            let error = AgentError::InvalidInput("voice message without audio".to_string());
            return (state.with_error(error), StepOutcome::Failed);
        };

        let transcript = match bounded(
            "transcription",
            self.timeouts.transcription(),
            self.transcriber.transcribe(audio),
        )
        .await
        {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!(audio = %audio.location(), error = %e, "Transcription failed");
                return (
                    state.with_error(AgentError::step(PipelineStep::SpeechToText, e)),
                    StepOutcome::Failed,
                );
            },
        };

        let detected = transcript.language_code.as_deref().and_then(|code| {
            let language = Language::from_code(code);
            if language.is_none() {
                tracing::warn!(code, "Unsupported detected language, falling back");
            }
            language
        });
        let resolved = detected.or_else(|| declared_language(message));
        let language = resolved
            .or(state.session.preferred_language)
            .unwrap_or(self.default_language);
        if let Some(language) = resolved {
            self.remember_language(&state, language).await;
        }

        tracing::debug!(language = %language, chars = transcript.text.len(), "Voice note transcribed");
        (
            state.with_language(language).with_query(transcript.text),
            StepOutcome::Done,
        )
    }

    async fn identify_intent(&self, state: PipelineState) -> (PipelineState, StepOutcome) {
        if state.english_query.is_empty() {
            tracing::warn!(sender = %state.sender_id, "No query text in message");
            let error = AgentError::InvalidInput(messages::NO_QUERY_FOUND.to_string());
            return (state.with_error(error), StepOutcome::Failed);
        }

        let classification = self
            .classifier
            .classify(&state.english_query, state.user_language)
            .await;
        let state = state.with_intent(
            classification.intent,
            classification.confidence,
            classification.slots,
        );

        match classification.failure {
            Some(e) => (
                state.with_error(AgentError::step(PipelineStep::IdentifyIntent, e)),
                StepOutcome::Failed,
            ),
            None => {
                let intent = state.intent;
                (state, StepOutcome::Routed(intent))
            },
        }
    }

    async fn remember_language(&self, state: &PipelineState, language: Language) {
        if state.session.preferred_language == Some(language) {
            return;
        }
        if let Err(e) = bounded(
            "session",
            self.timeouts.session(),
            self.sessions.set_preferred_language(&state.sender_id, language),
        )
        .await
        {
            tracing::warn!(sender = %state.sender_id, error = %e, "Failed to store preferred language");
        }
    }

    /// Store the English exchange for later prompts
    async fn remember_exchange(&self, state: &PipelineState) {
        let Some(reply) = state.llm_response_text.as_deref() else {
            return;
        };
        let exchange = [
            ConversationTurn::user(state.english_query.clone()),
            ConversationTurn::assistant(reply),
        ];
        if let Err(e) = bounded(
            "session",
            self.timeouts.session(),
            self.sessions.append(&state.sender_id, &exchange),
        )
        .await
        {
            tracing::warn!(sender = %state.sender_id, error = %e, "Failed to append conversation history");
        }
    }
}

/// Channel language hint; `auto`, empty and unsupported codes are ignored
fn declared_language(message: &InboundMessage) -> Option<Language> {
    let code = message.declared_language()?;
    let language = Language::from_code(code);
    if language.is_none() && !code.trim().is_empty() && !code.trim().eq_ignore_ascii_case("auto") {
        tracing::warn!(code, "Unsupported declared language, ignoring");
    }
    language
}

fn configured_language(field: &str, code: &str) -> Language {
    Language::from_code(code).unwrap_or_else(|| {
        tracing::warn!(field, code, "Unsupported language in pipeline config, using English");
        Language::English
    })
}
