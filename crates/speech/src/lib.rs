//! Sarvam AI adapters for the shopping assistant
//!
//! - [`SarvamTranscriber`]: voice note to English text plus detected language
//! - [`SarvamTranslator`]: text between Indian languages
//! - [`SarvamSynthesizer`]: text to a WAV file referenced by URL
//!
//! All three share one [`SarvamClient`] for authentication and error mapping.

pub mod audio;
pub mod client;
pub mod stt;
pub mod translate;
pub mod tts;

pub use audio::{detect_audio_format, merge_wav, AudioFormat, DetectedFormat, MediaStore};
pub use client::{MediaAuth, SarvamClient};
pub use stt::SarvamTranscriber;
pub use translate::SarvamTranslator;
pub use tts::{split_into_chunks, SarvamSynthesizer};

use thiserror::Error;

/// Speech adapter errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Network(err.to_string())
    }
}

impl From<hound::Error> for SpeechError {
    fn from(err: hound::Error) -> Self {
        SpeechError::Audio(err.to_string())
    }
}

impl SpeechError {
    /// Map into the shared error, tagged with the failing capability
    pub fn into_core(self, wrap: fn(String) -> indic_commerce_core::Error) -> indic_commerce_core::Error {
        match self {
            SpeechError::InvalidResponse(msg) => indic_commerce_core::Error::InvalidResponse(msg),
            SpeechError::Configuration(msg) => indic_commerce_core::Error::Configuration(msg),
            other => wrap(other.to_string()),
        }
    }
}
