//! Outbound response contract

use serde::{Deserialize, Serialize};

/// Terminal output of one pipeline run.
///
/// `text` is always populated; image and voice are optional extras the
/// transport sends as separate messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// URL or local path of the synthesized reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_url: Option<String>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: None,
            voice_url: None,
        }
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    pub fn with_voice(mut self, voice_url: Option<String>) -> Self {
        self.voice_url = voice_url;
        self
    }

    pub fn has_voice(&self) -> bool {
        self.voice_url.is_some()
    }
}
