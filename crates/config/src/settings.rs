//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, limits, models};
use crate::{ConfigError, PipelineConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// Classifier and responder model endpoints
    #[serde(default)]
    pub llm: LlmSettings,

    /// Sarvam speech and translation
    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub payments: PaymentsConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_speech()?;
        self.validate_pipeline()?;
        self.validate_session()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Request timeout must be greater than 0".to_string(),
            });
        }

        if let Some(url) = &self.server.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue {
                    field: "server.public_base_url".to_string(),
                    message: format!("Expected an http(s) URL, got '{}'", url),
                });
            }
        }

        if self.environment.is_production() && self.server.cors_origins.is_empty() {
            tracing::warn!("Production environment running with permissive CORS");
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("llm.classifier", &self.llm.classifier),
            ("llm.responder", &self.llm.responder),
        ] {
            if endpoint.model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.model", name),
                    message: "Model name cannot be empty".to_string(),
                });
            }

            if !(0.0..=2.0).contains(&endpoint.temperature) {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.temperature", name),
                    message: format!("Must be between 0.0 and 2.0, got {}", endpoint.temperature),
                });
            }

            if endpoint.max_tokens == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.max_tokens", name),
                    message: "Must be greater than 0".to_string(),
                });
            }

            if endpoint.provider == LlmProvider::Azure && endpoint.endpoint.is_none() {
                return Err(ConfigError::MissingField(format!("{}.endpoint", name)));
            }

            let needs_key = endpoint.provider != LlmProvider::Local;
            if self.environment.is_production() && needs_key && endpoint.api_key.is_none() {
                return Err(ConfigError::MissingField(format!("{}.api_key", name)));
            }
        }
        Ok(())
    }

    fn validate_speech(&self) -> Result<(), ConfigError> {
        let speech = &self.speech;

        if speech.max_chunk_chars == 0 || speech.max_chunk_chars > limits::TTS_MAX_CHARS {
            return Err(ConfigError::InvalidValue {
                field: "speech.max_chunk_chars".to_string(),
                message: format!(
                    "Must be between 1 and {}, got {}",
                    limits::TTS_MAX_CHARS,
                    speech.max_chunk_chars
                ),
            });
        }

        if speech.stt_model.trim().is_empty() || speech.tts_model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "speech".to_string(),
                message: "STT and TTS model names cannot be empty".to_string(),
            });
        }

        if self.environment.is_production() && speech.api_key.is_none() {
            return Err(ConfigError::MissingField("speech.api_key".to_string()));
        }

        Ok(())
    }

    fn validate_pipeline(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;

        if pipeline.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pipeline.search_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        for (field, value) in pipeline.timeouts.entries() {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("pipeline.timeouts.{}", field),
                    message: "Timeout budget must be greater than 0".to_string(),
                });
            }
        }

        for (field, code) in [
            ("pipeline.working_language", &pipeline.working_language),
            ("pipeline.default_language", &pipeline.default_language),
        ] {
            if indic_commerce_core::Language::from_code(code).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Unsupported language code '{}'", code),
                });
            }
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_history".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.session.backend == SessionBackend::File && self.session.directory.is_none() {
            return Err(ConfigError::MissingField("session.directory".to_string()));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL, used to turn media file names into links
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Directory where synthesized audio is written and served from
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_media_dir() -> String {
    "media".to_string()
}
fn default_timeout() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: None,
            media_dir: default_media_dir(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// LLM provider behind an OpenAI-compatible chat endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Azure,
    Sarvam,
    /// Self-hosted server (vLLM, Ollama) - no key required
    Local,
}

/// One chat model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEndpointConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL; provider default when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Azure API version
    #[serde(default)]
    pub api_version: Option<String>,
}

fn default_max_tokens() -> u32 {
    512
}

impl LlmEndpointConfig {
    /// Base URL, falling back to the provider's public endpoint
    pub fn base_url(&self) -> String {
        match (&self.endpoint, self.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::Sarvam) => endpoints::SARVAM_CHAT.to_string(),
            (None, LlmProvider::Local) => "http://localhost:11434/v1".to_string(),
            (None, _) => endpoints::OPENAI.to_string(),
        }
    }
}

/// Classifier and responder models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_classifier")]
    pub classifier: LlmEndpointConfig,

    #[serde(default = "default_responder")]
    pub responder: LlmEndpointConfig,
}

fn default_classifier() -> LlmEndpointConfig {
    LlmEndpointConfig {
        provider: LlmProvider::OpenAi,
        endpoint: None,
        api_key: std::env::var("OPENAI_API_KEY").ok(),
        model: models::CLASSIFIER.to_string(),
        temperature: 0.0,
        max_tokens: 256,
        api_version: None,
    }
}

fn default_responder() -> LlmEndpointConfig {
    LlmEndpointConfig {
        provider: LlmProvider::Sarvam,
        endpoint: None,
        api_key: std::env::var("SARVAM_API_KEY").ok(),
        model: models::RESPONDER.to_string(),
        temperature: 0.3,
        max_tokens: default_max_tokens(),
        api_version: None,
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            classifier: default_classifier(),
            responder: default_responder(),
        }
    }
}

/// Sarvam speech and translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_sarvam_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_sarvam_key")]
    pub api_key: Option<String>,

    /// Speech-to-English model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    #[serde(default = "default_speaker")]
    pub speaker: String,

    /// Gender hint passed to the translator
    #[serde(default = "default_speaker_gender")]
    pub speaker_gender: String,

    /// Upper bound per TTS request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Basic-auth user for downloading inbound media (Twilio account SID)
    #[serde(default = "default_media_username")]
    pub media_username: Option<String>,

    #[serde(default = "default_media_password")]
    pub media_password: Option<String>,
}

fn default_sarvam_endpoint() -> String {
    endpoints::SARVAM.to_string()
}
fn default_sarvam_key() -> Option<String> {
    std::env::var("SARVAM_API_KEY").ok()
}
fn default_stt_model() -> String {
    models::SARVAM_STT_TRANSLATE.to_string()
}
fn default_tts_model() -> String {
    models::SARVAM_TTS.to_string()
}
fn default_speaker() -> String {
    models::SARVAM_SPEAKER.to_string()
}
fn default_speaker_gender() -> String {
    "Female".to_string()
}
fn default_max_chunk_chars() -> usize {
    limits::TTS_MAX_CHARS
}
fn default_media_username() -> Option<String> {
    std::env::var("TWILIO_ACCOUNT_SID").ok()
}
fn default_media_password() -> Option<String> {
    std::env::var("TWILIO_AUTH_TOKEN").ok()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sarvam_endpoint(),
            api_key: default_sarvam_key(),
            stt_model: default_stt_model(),
            tts_model: default_tts_model(),
            speaker: default_speaker(),
            speaker_gender: default_speaker_gender(),
            max_chunk_chars: default_max_chunk_chars(),
            media_username: default_media_username(),
            media_password: default_media_password(),
        }
    }
}

/// Product catalog source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON/YAML file or a directory of them
    #[serde(default)]
    pub path: Option<String>,

    /// Load the bundled sample catalog when no path is configured
    #[serde(default = "default_true")]
    pub use_sample_catalog: bool,

    /// Prefix joined to relative image paths
    #[serde(default)]
    pub image_base_url: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            use_sample_catalog: true,
            image_base_url: None,
        }
    }
}

/// Checkout link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default = "default_checkout_base_url")]
    pub checkout_base_url: String,
}

fn default_checkout_base_url() -> String {
    "https://pay.example.com/checkout".to_string()
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            checkout_base_url: default_checkout_base_url(),
        }
    }
}

/// Session store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Directory for the file backend
    #[serde(default)]
    pub directory: Option<String>,

    /// Conversation turns kept per shopper
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    20
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            directory: None,
            max_history: default_max_history(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// OTLP endpoint for traces (requires the `telemetry` feature)
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            otlp_endpoint: None,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Order (later wins): `config/default.*`, `config/{env}.*`,
/// `INDIC_COMMERCE__SECTION__KEY` environment variables.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("INDIC_COMMERCE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.llm.classifier.model, "gpt-4o-mini");
        assert_eq!(settings.llm.responder.provider, LlmProvider::Sarvam);
        assert_eq!(settings.session.backend, SessionBackend::Memory);
        assert!(settings.catalog.use_sample_catalog);
    }

    #[test]
    fn test_settings_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.server.public_base_url = Some("ftp://example.com".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_pipeline_validation() {
        let mut settings = Settings::default();
        settings.pipeline.search_limit = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pipeline.timeouts.search_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("search_ms"));

        let mut settings = Settings::default();
        settings.pipeline.default_language = "xx-XX".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_llm_validation() {
        let mut settings = Settings::default();
        settings.llm.classifier.model = " ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.llm.responder.temperature = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.llm.classifier.provider = LlmProvider::Azure;
        settings.llm.classifier.endpoint = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_requires_keys() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.llm.classifier.api_key = None;
        settings.llm.responder.api_key = Some("k".to_string());
        settings.speech.api_key = Some("k".to_string());
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(field)) if field == "llm.classifier.api_key"
        ));

        settings.llm.classifier.provider = LlmProvider::Local;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_session_requires_directory() {
        let mut settings = Settings::default();
        settings.session.backend = SessionBackend::File;
        assert!(settings.validate().is_err());

        settings.session.directory = Some("/tmp/sessions".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_speech_chunk_limit() {
        let mut settings = Settings::default();
        settings.speech.max_chunk_chars = 800;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_base_url_defaults() {
        let mut endpoint = default_responder();
        assert_eq!(endpoint.base_url(), "https://api.sarvam.ai/v1");

        endpoint.endpoint = Some("http://llm.internal/v1/".to_string());
        assert_eq!(endpoint.base_url(), "http://llm.internal/v1");
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
server:
  port: 9090
  public_base_url: "https://shop.example.com"
pipeline:
  product_response: llm
session:
  backend: file
  directory: /var/lib/sessions
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.session.backend, SessionBackend::File);
        assert_eq!(settings.pipeline.search_limit, 3);
        assert!(settings.validate().is_ok());
    }
}
