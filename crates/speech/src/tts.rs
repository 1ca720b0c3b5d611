//! Text-to-speech via Sarvam `bulbul`
//!
//! Sarvam caps each request at a few hundred characters, so replies are
//! split on sentence boundaries, synthesized clip by clip and merged into
//! one WAV file.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use indic_commerce_core::{Error, Language, Result, SpeechSynthesizer};

use crate::audio::{merge_wav, MediaStore};
use crate::client::SarvamClient;
use crate::SpeechError;

const TTS_PATH: &str = "text-to-speech";

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    inputs: Vec<&'a str>,
    target_language_code: &'a str,
    speaker: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    audios: Vec<String>,
}

/// Split text into chunks of at most `max_chars` characters
///
/// Sentences are kept whole where they fit; longer sentences are split on
/// word boundaries, and a single overlong word is split by grapheme.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let push_piece = |piece: &str, current: &mut String, chunks: &mut Vec<String>| {
        if current.chars().count() + piece.chars().count() > max_chars && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
        }
        current.push_str(piece);
    };

    for sentence in text.unicode_sentences() {
        if sentence.chars().count() <= max_chars {
            push_piece(sentence, &mut current, &mut chunks);
            continue;
        }

        for word in sentence.split_word_bounds() {
            if word.chars().count() <= max_chars {
                push_piece(word, &mut current, &mut chunks);
                continue;
            }

            let graphemes: Vec<&str> = word.graphemes(true).collect();
            for grapheme in graphemes {
                push_piece(grapheme, &mut current, &mut chunks);
            }
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

pub struct SarvamSynthesizer {
    client: SarvamClient,
    model: String,
    speaker: String,
    max_chunk_chars: usize,
    media: MediaStore,
}

impl SarvamSynthesizer {
    pub fn new(
        client: SarvamClient,
        model: impl Into<String>,
        speaker: impl Into<String>,
        max_chunk_chars: usize,
        media: MediaStore,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            speaker: speaker.into(),
            max_chunk_chars,
            media,
        }
    }

    async fn synthesize_chunk(&self, chunk: &str, language: Language) -> std::result::Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            inputs: vec![chunk],
            target_language_code: language.code(),
            speaker: &self.speaker,
            model: &self.model,
        };

        let response: TtsResponse = self.client.post_json(TTS_PATH, &request).await?;
        let encoded = response
            .audios
            .into_iter()
            .next()
            .ok_or_else(|| SpeechError::InvalidResponse("No audio in TTS response".to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SpeechError::InvalidResponse(format!("Invalid base64 audio: {}", e)))
    }

    async fn synthesize_inner(&self, text: &str, language: Language) -> std::result::Result<String, SpeechError> {
        let chunks = split_into_chunks(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Err(SpeechError::Audio("Nothing to synthesize".to_string()));
        }

        let mut clips = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            clips.push(self.synthesize_chunk(chunk, language).await?);
        }

        let merged = merge_wav(&clips)?;
        let reference = self.media.save(&merged, "wav").await?;

        tracing::info!(
            language = %language,
            chunks = chunks.len(),
            size = merged.len(),
            "Synthesized reply audio"
        );
        Ok(reference)
    }
}

#[async_trait]
impl SpeechSynthesizer for SarvamSynthesizer {
    async fn synthesize(&self, text: &str, language: Language) -> Result<String> {
        self.synthesize_inner(text, language)
            .await
            .map_err(|e| e.into_core(Error::Synthesis))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn wav_base64(samples: &[i16]) -> String {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        base64::engine::general_purpose::STANDARD.encode(cursor.into_inner())
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_into_chunks("I found Running Shoes for ₹2499.", 500);
        assert_eq!(chunks, vec!["I found Running Shoes for ₹2499.".to_string()]);
        assert!(split_into_chunks("   ", 500).is_empty());
    }

    #[test]
    fn test_chunks_respect_limit_and_sentences() {
        let text = "First sentence here. Second sentence is a bit longer. Third one.";
        let chunks = split_into_chunks(text, 40);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "chunk too long: {}", chunk);
        }
        assert!(chunks[0].starts_with("First sentence here."));
        assert_eq!(chunks.join(" ").split_whitespace().count(), text.split_whitespace().count());
    }

    #[test]
    fn test_overlong_sentence_and_word() {
        let text = "नमस्ते ".repeat(30);
        for chunk in split_into_chunks(&text, 25) {
            assert!(chunk.chars().count() <= 25);
        }

        let word = "a".repeat(30);
        let chunks = split_into_chunks(&word, 10);
        assert_eq!(chunks.len(), 3);
    }

    #[tokio::test]
    async fn test_synthesize_merges_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/text-to-speech",
            post(move |Json(body): Json<serde_json::Value>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(body["target_language_code"], "hi-IN");
                    Json(serde_json::json!({ "audios": [wav_base64(&[1, 2, 3])] }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let client =
            SarvamClient::new(format!("http://{}", addr), "key", Duration::from_secs(5)).unwrap();
        let tts = SarvamSynthesizer::new(
            client,
            "bulbul:v1",
            "meera",
            30,
            MediaStore::new(dir.path(), Some("https://shop.example.com".to_string())),
        );

        let url = tts
            .synthesize("Pehla vakya yahan hai. Doosra vakya yahan hai.", Language::Hindi)
            .await
            .unwrap();

        assert!(url.starts_with("https://shop.example.com/media/"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let file_name = url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(dir.path().join(file_name)).unwrap();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 6);
    }

    #[tokio::test]
    async fn test_synthesize_unreachable_is_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let client =
            SarvamClient::new("http://127.0.0.1:9", "key", Duration::from_secs(1)).unwrap();
        let tts = SarvamSynthesizer::new(
            client,
            "bulbul:v1",
            "meera",
            500,
            MediaStore::new(dir.path(), None),
        );
        let err = tts.synthesize("hello", Language::English).await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }
}
