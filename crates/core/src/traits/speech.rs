//! Speech processing traits

use crate::{AudioRef, Language, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// English transcript of a voice note plus the language it was spoken in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Text translated to the working language (English)
    pub text: String,
    /// Language code detected by the provider (`hi-IN`), if reported
    pub language_code: Option<String>,
}

/// Speech-to-English interface
///
/// Implementations:
/// - `SarvamTranscriber` - Sarvam `saaras` speech-to-text-translate
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn Transcriber> = Arc::new(SarvamTranscriber::new(client));
/// let transcript = stt.transcribe(&AudioRef::file("note.ogg", None)).await?;
/// println!("{} ({:?})", transcript.text, transcript.language_code);
/// ```
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribe a voice note straight into English
    ///
    /// # Arguments
    /// * `audio` - Reference to the shopper's voice note
    ///
    /// # Returns
    /// English text and the detected source language
    async fn transcribe(&self, audio: &AudioRef) -> Result<Transcript>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech interface
///
/// Returns a reference (URL or file path) to the rendered audio rather than
/// raw samples; the transport sends it as a media message.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesize text to an audio reference
    ///
    /// # Arguments
    /// * `text` - Text to speak, already in `language`
    /// * `language` - Voice language
    async fn synthesize(&self, text: &str, language: Language) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
