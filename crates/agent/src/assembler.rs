//! Response assembly
//!
//! Every branch converges here. Translation and voice are applied in one
//! place, only for voice input or non-English shoppers, and their failure
//! never fails the run: the shopper gets the text that is available and no
//! voice note.

use std::sync::Arc;

use indic_commerce_config::constants::messages;
use indic_commerce_config::TimeoutConfig;
use indic_commerce_core::{Language, Response, SpeechSynthesizer, Translator};

use crate::bounded;
use crate::state::PipelineState;

pub struct ResponseAssembler {
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    working_language: Language,
    timeouts: TimeoutConfig,
}

impl ResponseAssembler {
    pub fn new(
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        working_language: Language,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            translator,
            synthesizer,
            working_language,
            timeouts,
        }
    }

    /// Build the single response for a finished run
    pub async fn assemble(&self, state: &PipelineState) -> Response {
        if let Some(ref error) = state.error_message {
            tracing::debug!(error = %error, "Assembling apology response");
            return Response::text(messages::APOLOGY);
        }

        let text = match state.llm_response_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                tracing::warn!("Run reached assembly without reply text");
                return Response::text(messages::APOLOGY);
            },
        };

        let image_url = state.image_url();
        let language = state.user_language;
        if !state.is_audio && language == self.working_language {
            return Response::text(text).with_image(image_url);
        }

        let localized = if language == self.working_language {
            text
        } else {
            match bounded(
                "translation",
                self.timeouts.translation(),
                self.translator.translate(&text, self.working_language, language),
            )
            .await
            {
                Ok(translated) if !translated.trim().is_empty() => translated,
                Ok(_) => {
                    tracing::warn!(language = %language, "Empty translation, sending English text without voice");
                    return Response::text(text).with_image(image_url);
                },
                Err(e) => {
                    tracing::warn!(
                        language = %language,
                        error = %e,
                        "Translation failed, sending English text without voice"
                    );
                    return Response::text(text).with_image(image_url);
                },
            }
        };

        let voice_url = match bounded(
            "synthesis",
            self.timeouts.synthesis(),
            self.synthesizer.synthesize(&localized, language),
        )
        .await
        {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!(language = %language, error = %e, "Speech synthesis failed, omitting voice");
                None
            },
        };

        Response::text(localized)
            .with_image(image_url)
            .with_voice(voice_url)
    }
}
