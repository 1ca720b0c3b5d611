//! Builds language models from configuration
//!
//! ## Example
//! ```ignore
//! let settings = load_settings(None)?;
//! let classifier = LlmFactory::create(&settings.llm.classifier, Duration::from_secs(10))?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use indic_commerce_config::{LlmEndpointConfig, LlmProvider};
use indic_commerce_core::LanguageModel;

use crate::{
    adapter::LanguageModelAdapter,
    backend::{OpenAIBackend, OpenAIConfig},
    LlmError,
};

/// Default Azure API version when none is configured
const AZURE_API_VERSION: &str = "2024-02-15-preview";

pub struct LlmFactory;

impl LlmFactory {
    /// Translate an endpoint section into backend configuration
    pub fn backend_config(
        config: &LlmEndpointConfig,
        timeout: Duration,
    ) -> Result<OpenAIConfig, LlmError> {
        let api_key = config.api_key.clone().unwrap_or_default();

        let backend = match config.provider {
            LlmProvider::OpenAi => OpenAIConfig::openai(api_key, &config.model),
            LlmProvider::Sarvam => OpenAIConfig::sarvam(api_key, &config.model),
            LlmProvider::Local => OpenAIConfig::local(config.base_url(), &config.model),
            LlmProvider::Azure => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    LlmError::Configuration("Azure provider requires an endpoint".to_string())
                })?;
                OpenAIConfig::azure(
                    endpoint,
                    api_key,
                    &config.model,
                    config
                        .api_version
                        .clone()
                        .unwrap_or_else(|| AZURE_API_VERSION.to_string()),
                )
            },
        };

        let mut backend = backend.with_sampling(config.temperature, config.max_tokens);
        if config.provider != LlmProvider::Azure {
            backend = backend.with_endpoint(config.base_url());
        }
        backend.timeout = timeout;
        Ok(backend)
    }

    /// Create a language model for one endpoint section
    pub fn create(
        config: &LlmEndpointConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let backend = OpenAIBackend::new(Self::backend_config(config, timeout)?)?;

        tracing::info!(
            provider = ?config.provider,
            model = %config.model,
            "Language model configured"
        );

        Ok(Arc::new(LanguageModelAdapter::new(backend)))
    }
}
