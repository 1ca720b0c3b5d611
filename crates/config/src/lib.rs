//! Configuration management for the shopping assistant
//!
//! Supports loading configuration from:
//! - YAML/TOML/JSON files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (`INDIC_COMMERCE__` prefix, `__` separator)

pub mod constants;
pub mod pipeline;
pub mod settings;

pub use pipeline::{PipelineConfig, ProductResponseMode, TimeoutConfig};
pub use settings::{
    load_settings, CatalogConfig, LlmEndpointConfig, LlmProvider, LlmSettings,
    ObservabilityConfig, PaymentsConfig, RuntimeEnvironment, ServerConfig, SessionBackend,
    SessionConfig, Settings, SpeechConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for indic_commerce_core::Error {
    fn from(err: ConfigError) -> Self {
        indic_commerce_core::Error::Configuration(err.to_string())
    }
}
