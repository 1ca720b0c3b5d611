//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use indic_commerce_agent::{PipelineAdapters, ShoppingPipeline};
use indic_commerce_config::Settings;
use indic_commerce_llm::LlmFactory;
use indic_commerce_rag::CatalogIndex;
use indic_commerce_speech::{
    MediaStore, SarvamClient, SarvamSynthesizer, SarvamTranscriber, SarvamTranslator,
};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub pipeline: Arc<ShoppingPipeline>,
    /// Products in the catalog index at startup
    pub catalog_size: usize,
    pub session_backend: String,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state around already constructed adapters
    pub fn new(config: Settings, adapters: PipelineAdapters) -> Self {
        let catalog_size = adapters.catalog.len();
        let session_backend = adapters.sessions.backend_name().to_string();
        let pipeline = ShoppingPipeline::new(adapters, &config.pipeline, &config.payments);

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            catalog_size,
            session_backend,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Wire the production adapters described by `settings`
    pub async fn from_settings(settings: Settings) -> Result<Self, ServerError> {
        let adapters = build_adapters(&settings).await?;
        Ok(Self::new(settings, adapters))
    }
}

async fn build_adapters(settings: &Settings) -> Result<PipelineAdapters, ServerError> {
    let timeouts = &settings.pipeline.timeouts;

    let catalog = CatalogIndex::from_config(&settings.catalog)
        .map_err(|e| ServerError::Startup(format!("catalog: {}", e)))?;
    tracing::info!(products = catalog.doc_count(), "Catalog indexed");

    let sessions = indic_commerce_persistence::init(&settings.session)
        .await
        .map_err(|e| ServerError::Startup(format!("session store: {}", e)))?;

    let classifier = LlmFactory::create(&settings.llm.classifier, timeouts.classification())
        .map_err(indic_commerce_core::Error::from)?;
    let responder = LlmFactory::create(&settings.llm.responder, timeouts.generation())
        .map_err(indic_commerce_core::Error::from)?;

    let speech = &settings.speech;
    let client = SarvamClient::from_config(speech, timeouts.transcription())
        .map_err(|e| ServerError::Configuration(e.to_string()))?;
    let media = MediaStore::new(&settings.server.media_dir, settings.server.public_base_url.clone());

    Ok(PipelineAdapters {
        transcriber: Arc::new(SarvamTranscriber::new(client.clone(), &speech.stt_model)),
        translator: Arc::new(SarvamTranslator::new(client.clone(), &speech.speaker_gender)),
        synthesizer: Arc::new(SarvamSynthesizer::new(
            client,
            &speech.tts_model,
            &speech.speaker,
            speech.max_chunk_chars,
            media,
        )),
        catalog: Arc::new(catalog),
        classifier,
        responder,
        sessions,
    })
}
