//! LLM integration for the shopping assistant
//!
//! Features:
//! - OpenAI-compatible chat backend (OpenAI, Azure, Sarvam, local servers)
//! - JSON-mode classification with tolerant object extraction
//! - Prompt builders for classification, recommendations, cart and policy replies

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod prompt;

pub use adapter::{extract_json_object, LanguageModelAdapter};
pub use backend::{AuthStyle, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig};
pub use factory::LlmFactory;
pub use prompt::PromptBuilder;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for indic_commerce_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => indic_commerce_core::Error::InvalidResponse(msg),
            other => indic_commerce_core::Error::Llm(other.to_string()),
        }
    }
}
