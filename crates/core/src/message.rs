//! Inbound shopper messages

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the audio of a voice note lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    /// Remote media URL (e.g. a Twilio media link)
    Url(String),
    /// Local file already downloaded by the transport
    File(PathBuf),
}

/// Reference to a voice note plus the MIME type reported by the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRef {
    pub source: AudioSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl AudioRef {
    pub fn url(url: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            source: AudioSource::Url(url.into()),
            content_type,
        }
    }

    pub fn file(path: impl Into<PathBuf>, content_type: Option<String>) -> Self {
        Self {
            source: AudioSource::File(path.into()),
            content_type,
        }
    }

    /// Path or URL, for logging
    pub fn location(&self) -> String {
        match &self.source {
            AudioSource::Url(url) => url.clone(),
            AudioSource::File(path) => path.display().to_string(),
        }
    }
}

/// Raw content of one shopper turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { body: String },
    Audio { audio: AudioRef },
}

/// One inbound shopper turn.
///
/// Created once by the transport and never modified afterwards; the
/// orchestrator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    sender_id: String,
    content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    declared_language: Option<String>,
}

impl InboundMessage {
    pub fn text(sender_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            content: MessageContent::Text { body: body.into() },
            declared_language: None,
        }
    }

    pub fn audio(sender_id: impl Into<String>, audio: AudioRef) -> Self {
        Self {
            sender_id: sender_id.into(),
            content: MessageContent::Audio { audio },
            declared_language: None,
        }
    }

    /// Attach the channel's language hint (e.g. `hi-IN`, `auto`)
    pub fn with_declared_language(mut self, language: impl Into<String>) -> Self {
        self.declared_language = Some(language.into());
        self
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub fn declared_language(&self) -> Option<&str> {
        self.declared_language.as_deref()
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.content, MessageContent::Audio { .. })
    }

    /// Text body for text messages, `None` for voice notes
    pub fn text_body(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text { body } => Some(body),
            MessageContent::Audio { .. } => None,
        }
    }

    pub fn audio_ref(&self) -> Option<&AudioRef> {
        match &self.content {
            MessageContent::Audio { audio } => Some(audio),
            MessageContent::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message() {
        let msg = InboundMessage::text("whatsapp:+919800000000", "Show me running shoes")
            .with_declared_language("en-IN");
        assert!(!msg.is_audio());
        assert_eq!(msg.text_body(), Some("Show me running shoes"));
        assert_eq!(msg.declared_language(), Some("en-IN"));
        assert!(msg.audio_ref().is_none());
    }

    #[test]
    fn test_audio_message_json_shape() {
        let msg = InboundMessage::audio(
            "user-1",
            AudioRef::url("https://media.example/abc", Some("audio/ogg".into())),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"]["type"], "audio");
        assert_eq!(json["content"]["audio"]["source"]["url"], "https://media.example/abc");

        let back: InboundMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
