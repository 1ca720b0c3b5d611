//! Shared error type for adapter seams
//!
//! Each capability crate keeps its own error enum and converts into
//! [`Error`] at the trait boundary, so the orchestrator only has to
//! reason about one type.

use thiserror::Error;

/// Result alias used by every adapter trait
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Product search error: {0}")]
    Search(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Session store error: {0}")]
    Session(String),

    /// The call completed but its payload could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{operation} timed out after {budget_ms}ms")]
    Timeout { operation: String, budget_ms: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn timeout(operation: impl Into<String>, budget_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            budget_ms,
        }
    }

    /// True when the upstream call itself succeeded but returned garbage.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, Error::InvalidResponse(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponse(err.to_string())
    }
}
