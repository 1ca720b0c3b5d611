//! Text translation via Sarvam `/translate`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use indic_commerce_config::constants::limits;
use indic_commerce_core::{Error, Language, Result, Translator};

use crate::client::SarvamClient;
use crate::tts::split_into_chunks;
use crate::SpeechError;

const TRANSLATE_PATH: &str = "translate";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    input: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
    speaker_gender: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

pub struct SarvamTranslator {
    client: SarvamClient,
    speaker_gender: String,
}

impl SarvamTranslator {
    pub fn new(client: SarvamClient, speaker_gender: impl Into<String>) -> Self {
        Self {
            client,
            speaker_gender: speaker_gender.into(),
        }
    }

    async fn translate_inner(
        &self,
        text: &str,
        from: Language,
        to: Language,
    ) -> std::result::Result<String, SpeechError> {
        let mut translated = Vec::new();
        for chunk in split_into_chunks(text, limits::TRANSLATE_MAX_CHARS) {
            let request = TranslateRequest {
                input: &chunk,
                source_language_code: from.code(),
                target_language_code: to.code(),
                speaker_gender: &self.speaker_gender,
            };
            let response: TranslateResponse =
                self.client.post_json(TRANSLATE_PATH, &request).await?;
            translated.push(response.translated_text.trim().to_string());
        }
        Ok(translated.join(" "))
    }
}

#[async_trait]
impl Translator for SarvamTranslator {
    async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
        if !self.supports_pair(from, to) || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let translated = self
            .translate_inner(text, from, to)
            .await
            .map_err(|e| e.into_core(Error::Translation))?;

        tracing::debug!(from = %from, to = %to, "Translated reply");
        Ok(translated)
    }

    fn name(&self) -> &str {
        "sarvam-translate"
    }
}
