//! IndicCommerce Server
//!
//! Exposes the shopping pipeline over HTTP: the Twilio WhatsApp webhook,
//! a JSON message API, synthesized media, health and metrics endpoints.

pub mod http;
pub mod metrics;
pub mod state;
pub mod webhook;

pub use http::create_router;
pub use metrics::{init_metrics, record_error, record_intent, record_request, record_total_latency};
pub use state::AppState;
pub use webhook::{render_twiml, TwilioMessage};

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<indic_commerce_core::Error> for ServerError {
    fn from(err: indic_commerce_core::Error) -> Self {
        match err {
            indic_commerce_core::Error::Configuration(msg) => ServerError::Configuration(msg),
            indic_commerce_core::Error::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            other => ServerError::Startup(other.to_string()),
        }
    }
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Configuration(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Startup(_) => axum::http::StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
