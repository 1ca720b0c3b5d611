//! Twilio WhatsApp webhook
//!
//! `POST /webhook` receives Twilio's form-encoded message callback, runs the
//! pipeline and answers with TwiML. Each non-empty response field becomes its
//! own `<Message>` so WhatsApp shows the text, product image and voice note
//! as separate bubbles.

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;

use indic_commerce_core::{AudioRef, InboundMessage, Response};

use crate::http::process_message;
use crate::state::AppState;
use crate::ServerError;

/// Fields of a Twilio messaging webhook we use
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioMessage {
    #[serde(rename = "Body", default)]
    pub body: String,
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
    #[serde(rename = "MediaContentType0", default)]
    pub media_content_type: Option<String>,
    /// Optional language hint set by a Studio flow
    #[serde(rename = "Language", default)]
    pub language: Option<String>,
}

impl TwilioMessage {
    /// Convert to a pipeline message; audio attachments win over the body
    pub fn into_inbound(self) -> Result<InboundMessage, ServerError> {
        let sender = self.from.trim();
        if sender.is_empty() {
            return Err(ServerError::InvalidRequest("missing From".to_string()));
        }

        let audio = match (self.media_url.as_deref(), self.media_content_type.as_deref()) {
            (Some(url), Some(content_type))
                if !url.trim().is_empty() && content_type.trim().starts_with("audio/") =>
            {
                Some(AudioRef::url(url.trim(), Some(content_type.trim().to_string())))
            },
            _ => None,
        };

        let message = match audio {
            Some(audio) => InboundMessage::audio(sender, audio),
            None => InboundMessage::text(sender, self.body),
        };

        Ok(match self.language {
            Some(language) if !language.trim().is_empty() => message.with_declared_language(language),
            _ => message,
        })
    }
}

/// `POST /webhook`
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    Form(form): Form<TwilioMessage>,
) -> Result<impl IntoResponse, StatusCode> {
    let message = form.into_inbound().map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook call");
        StatusCode::from(e)
    })?;

    let mut response = process_message(&state, "whatsapp", &message).await;
    let base_url = state.config.server.public_base_url.as_deref();
    response.image_url = response.image_url.map(|url| fetchable_media(url, base_url));
    response.voice_url = response.voice_url.map(|url| fetchable_media(url, base_url));

    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        render_twiml(&response),
    ))
}

/// Twilio fetches `<Media>` itself, so relative paths such as catalog
/// images under `/static` are resolved against the public base URL
fn fetchable_media(url: String, base_url: Option<&str>) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url;
    }
    match base_url {
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
        None => {
            tracing::warn!(media = %url, "Media is a local path; set server.public_base_url so Twilio can fetch it");
            url
        },
    }
}

/// TwiML reply with one `<Message>` per response part
pub fn render_twiml(response: &Response) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);

    if !response.text.trim().is_empty() {
        xml.push_str(&format!("<Message><Body>{}</Body></Message>", escape_xml(&response.text)));
    }
    for media in [&response.image_url, &response.voice_url].into_iter().flatten() {
        if !media.trim().is_empty() {
            xml.push_str(&format!("<Message><Media>{}</Media></Message>", escape_xml(media)));
        }
    }

    xml.push_str("</Response>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
