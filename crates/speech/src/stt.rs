//! Speech-to-English transcription via Sarvam `saaras`
//!
//! One request both transcribes and translates to English, and reports the
//! language the shopper spoke.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use indic_commerce_core::{AudioRef, AudioSource, Error, Result, Transcriber, Transcript};

use crate::audio::detect_audio_format;
use crate::client::SarvamClient;
use crate::SpeechError;

const STT_TRANSLATE_PATH: &str = "speech-to-text-translate";

#[derive(Debug, Deserialize)]
struct SttTranslateResponse {
    transcript: String,
    #[serde(default)]
    language_code: Option<String>,
}

pub struct SarvamTranscriber {
    client: SarvamClient,
    model: String,
}

impl SarvamTranscriber {
    pub fn new(client: SarvamClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Fetch the clip bytes plus the best content-type hint available
    async fn load(&self, audio: &AudioRef) -> std::result::Result<(Vec<u8>, Option<String>), SpeechError> {
        match &audio.source {
            AudioSource::Url(url) => {
                let (bytes, served_type) = self.client.download(url).await?;
                Ok((bytes, audio.content_type.clone().or(served_type)))
            },
            AudioSource::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok((bytes, audio.content_type.clone()))
            },
        }
    }

    async fn transcribe_inner(&self, audio: &AudioRef) -> std::result::Result<Transcript, SpeechError> {
        let (bytes, content_type) = self.load(audio).await?;
        if bytes.is_empty() {
            return Err(SpeechError::Audio("Audio clip is empty".to_string()));
        }

        let detected = detect_audio_format(content_type.as_deref(), &audio.location());
        tracing::info!(
            size = bytes.len(),
            format = ?detected.format,
            "Sending audio to Sarvam for transcription"
        );

        let part = Part::bytes(bytes)
            .file_name(format!("audio{}", detected.extension))
            .mime_str(detected.format.mime_type())
            .map_err(|e| SpeechError::Audio(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let response: SttTranslateResponse =
            self.client.post_multipart(STT_TRANSLATE_PATH, form).await?;

        Ok(Transcript {
            text: response.transcript.trim().to_string(),
            language_code: response.language_code.filter(|code| !code.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Transcriber for SarvamTranscriber {
    async fn transcribe(&self, audio: &AudioRef) -> Result<Transcript> {
        let transcript = self
            .transcribe_inner(audio)
            .await
            .map_err(|e| e.into_core(Error::Transcription))?;

        tracing::info!(
            language = transcript.language_code.as_deref().unwrap_or("unknown"),
            "Transcribed voice note"
        );
        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use std::time::Duration;

    async fn spawn_fake_sarvam(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_transcribe_local_file() {
        let router = Router::new().route(
            "/speech-to-text-translate",
            post(|| async {
                Json(serde_json::json!({
                    "transcript": " show me running shoes ",
                    "language_code": "hi-IN"
                }))
            }),
        );
        let endpoint = spawn_fake_sarvam(router).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.ogg");
        std::fs::write(&path, b"OggS fake audio").unwrap();

        let client = SarvamClient::new(endpoint, "key", Duration::from_secs(5)).unwrap();
        let stt = SarvamTranscriber::new(client, "saaras:v2");
        let transcript = stt
            .transcribe(&AudioRef::file(&path, Some("audio/ogg".to_string())))
            .await
            .unwrap();

        assert_eq!(transcript.text, "show me running shoes");
        assert_eq!(transcript.language_code.as_deref(), Some("hi-IN"));
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let router = Router::new().route(
            "/speech-to-text-translate",
            post(|| async { (axum::http::StatusCode::BAD_REQUEST, "unsupported format") }),
        );
        let endpoint = spawn_fake_sarvam(router).await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let client = SarvamClient::new(endpoint, "key", Duration::from_secs(5)).unwrap();
        let stt = SarvamTranscriber::new(client, "saaras:v2");
        let err = stt.transcribe(&AudioRef::file(&path, None)).await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }

    #[tokio::test]
    async fn test_transcribe_missing_file() {
        let client =
            SarvamClient::new("http://127.0.0.1:9", "key", Duration::from_secs(1)).unwrap();
        let stt = SarvamTranscriber::new(client, "saaras:v2");
        let err = stt
            .transcribe(&AudioRef::file("/nonexistent/note.ogg", None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }
}
