//! Router tests with fake providers behind the real catalog and session store

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use indic_commerce_agent::PipelineAdapters;
use indic_commerce_config::constants::messages;
use indic_commerce_config::Settings;
use indic_commerce_core::{
    AudioRef, Error, GenerateRequest, GenerateResponse, Language, LanguageModel, Result,
    SpeechSynthesizer, Transcriber, Transcript, Translator,
};
use indic_commerce_persistence::InMemorySessionStore;
use indic_commerce_rag::{sample_products, CatalogIndex};
use indic_commerce_server::{create_router, AppState};

struct ShoeClassifier;

#[async_trait]
impl LanguageModel for ShoeClassifier {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();
        let reply = if prompt.contains("shoes") {
            r#"{"intent_type": "product_query", "confidence": 0.9, "search_terms": "running shoes"}"#
        } else {
            r#"{"intent_type": "summarize_cart", "confidence": 0.9}"#
        };
        Ok(GenerateResponse::text(reply))
    }

    fn model_name(&self) -> &str {
        "shoe-classifier"
    }
}

struct SilentResponder;

#[async_trait]
impl LanguageModel for SilentResponder {
    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
        Err(Error::Llm("not used".into()))
    }

    fn model_name(&self) -> &str {
        "silent"
    }
}

struct NoSpeech;

#[async_trait]
impl Transcriber for NoSpeech {
    async fn transcribe(&self, _audio: &AudioRef) -> Result<Transcript> {
        Err(Error::Transcription("offline".into()))
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

#[async_trait]
impl Translator for NoSpeech {
    async fn translate(&self, text: &str, _from: Language, _to: Language) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

#[async_trait]
impl SpeechSynthesizer for NoSpeech {
    async fn synthesize(&self, _text: &str, _language: Language) -> Result<String> {
        Err(Error::Synthesis("offline".into()))
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

fn app(media_dir: &std::path::Path) -> axum::Router {
    app_with_base_url(media_dir, None)
}

fn app_with_base_url(media_dir: &std::path::Path, base_url: Option<&str>) -> axum::Router {
    let mut settings = Settings::default();
    settings.server.media_dir = media_dir.display().to_string();
    settings.server.public_base_url = base_url.map(str::to_string);

    let adapters = PipelineAdapters {
        transcriber: Arc::new(NoSpeech),
        translator: Arc::new(NoSpeech),
        synthesizer: Arc::new(NoSpeech),
        catalog: Arc::new(CatalogIndex::with_products(&sample_products()).unwrap()),
        classifier: Arc::new(ShoeClassifier),
        responder: Arc::new(SilentResponder),
        sessions: Arc::new(InMemorySessionStore::default()),
    };
    create_router(AppState::new(settings, adapters))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["catalog"]["products"], 5);
    assert_eq!(json["checks"]["sessions"]["backend"], "memory");
}

#[tokio::test]
async fn test_ready() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_json_message() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/api/messages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"sender_id": "api-user-1", "text": "Show me running shoes"}"#,
        ))
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(json["text"]
        .as_str()
        .unwrap()
        .starts_with("I found a Running Shoes for ₹2499."));
    assert_eq!(json["image_url"], "/static/products/shoe.jpg");
    assert!(json.get("voice_url").is_none());
}

#[tokio::test]
async fn test_json_message_requires_sender() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/api/messages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"sender_id": " ", "text": "hello"}"#))
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whatsapp_webhook_replies_with_twiml() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "From=whatsapp%3A%2B919800000000&Body=what%27s+in+my+cart%3F",
        ))
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );

    let xml = body_string(response).await;
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains("<Message><Body>Your cart is empty right now."));
    assert_eq!(xml.matches("<Message>").count(), 1);
    assert!(xml.contains(&messages::EMPTY_CART.replace('\'', "&apos;")));
}

#[tokio::test]
async fn test_webhook_product_image_is_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "From=whatsapp%3A%2B919800000000&Body=Show+me+running+shoes",
        ))
        .unwrap();

    let response = app_with_base_url(dir.path(), Some("https://shop.example.com"))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let xml = body_string(response).await;
    assert!(xml.contains("<Message><Body>I found a Running Shoes for ₹2499."));
    assert!(xml.contains(
        "<Message><Media>https://shop.example.com/static/products/shoe.jpg</Media></Message>"
    ));
}

#[tokio::test]
async fn test_webhook_voice_failure_is_apology() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "From=whatsapp%3A%2B919800000000&Body=&MediaUrl0=https%3A%2F%2Fapi.twilio.com%2Fmedia%2FME1&MediaContentType0=audio%2Fogg",
        ))
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains("Sorry, I encountered an error"));
    assert!(!xml.contains("<Media>"));
}

#[tokio::test]
async fn test_webhook_without_sender_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("Body=hello"))
        .unwrap();

    let response = app(dir.path()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path())
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_media_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("reply.wav"), b"RIFF").unwrap();

    let response = app(dir.path())
        .oneshot(Request::get("/media/reply.wav").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "RIFF");
}
