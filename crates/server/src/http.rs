//! HTTP Endpoints
//!
//! REST API for the shopping assistant.

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use indic_commerce_core::{AudioRef, InboundMessage, Response};

use crate::metrics::{metrics_handler, record_error, record_intent, record_request, record_total_latency};
use crate::state::AppState;
use crate::webhook::whatsapp_webhook;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);
    let media = ServeDir::new(&server.media_dir);

    Router::new()
        // Channels
        .route("/webhook", post(whatsapp_webhook))
        .route("/api/messages", post(post_message))
        // Synthesized voice replies
        .nest_service("/media", media)
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, no cross-origin requests are allowed
/// - If cors_origins is empty, any origin may call the JSON API
/// - Otherwise, only the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::new();
    }

    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, disabling cross-origin access");
        return CorsLayer::new();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Run one message through the pipeline and record metrics for it
pub(crate) async fn process_message(
    state: &AppState,
    channel: &'static str,
    message: &InboundMessage,
) -> Response {
    record_request(channel, if message.is_audio() { "audio" } else { "text" });

    let (response, report) = state.pipeline.handle_with_report(message).await;

    if let Some(intent) = report.intent {
        record_intent(intent.as_str());
    }
    if report.is_error() {
        record_error(channel);
    }
    record_total_latency(channel, report.elapsed);

    tracing::info!(
        channel,
        sender = %message.sender_id(),
        intent = report.intent.map(|i| i.as_str()).unwrap_or("none"),
        image = response.image_url.is_some(),
        voice = response.has_voice(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Message handled"
    );
    response
}

/// JSON message request
#[derive(Debug, Deserialize)]
struct MessageRequest {
    sender_id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(default)]
    audio_content_type: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

impl MessageRequest {
    fn into_inbound(self) -> Result<InboundMessage, StatusCode> {
        if self.sender_id.trim().is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }

        let message = match self.audio_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => InboundMessage::audio(self.sender_id, AudioRef::url(url, self.audio_content_type)),
            None => InboundMessage::text(self.sender_id, self.text.unwrap_or_default()),
        };

        Ok(match self.language {
            Some(language) => message.with_declared_language(language),
            None => message,
        })
    }
}

/// `POST /api/messages`
async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Response>, StatusCode> {
    let message = request.into_inbound()?;
    Ok(Json(process_message(&state, "api", &message).await))
}

/// Liveness plus a summary of what was wired at startup
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "catalog": { "products": state.catalog_size },
            "sessions": { "backend": state.session_backend },
            "metrics": { "enabled": state.metrics.is_some() },
        }
    }))
}

/// Ready once the catalog has products and the media directory is usable
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut checks = serde_json::Map::new();
    let mut ready = true;

    let catalog_ok = state.catalog_size > 0;
    checks.insert(
        "catalog".to_string(),
        serde_json::json!({
            "status": if catalog_ok { "ok" } else { "empty" },
            "products": state.catalog_size
        }),
    );
    if !catalog_ok {
        ready = false;
    }

    let media_dir = state.config.server.media_dir.clone();
    let media_ok = match tokio::fs::create_dir_all(&media_dir).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(dir = %media_dir, error = %e, "Media directory unavailable");
            false
        },
    };
    checks.insert(
        "media_dir".to_string(),
        serde_json::json!({
            "status": if media_ok { "ok" } else { "unavailable" },
            "path": media_dir
        }),
    );
    if !media_ok {
        ready = false;
    }

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": checks
        })),
    )
}
