//! Prometheus metrics
//!
//! Counters and histograms are recorded through the `metrics` facade; the
//! Prometheus recorder is installed once at startup and rendered at
//! `GET /metrics`.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::state::AppState;

const REQUESTS_TOTAL: &str = "indic_commerce_requests_total";
const INTENTS_TOTAL: &str = "indic_commerce_intents_total";
const ERRORS_TOTAL: &str = "indic_commerce_errors_total";
const RESPONSE_SECONDS: &str = "indic_commerce_response_seconds";

/// Install the global Prometheus recorder
///
/// Returns `None` if a recorder is already installed (tests, or a second
/// call) so startup never fails on metrics.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(RESPONSE_SECONDS.to_string()),
        &[0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 15.0, 30.0],
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid histogram buckets, using summaries");
            PrometheusBuilder::new()
        },
    };

    match builder.install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            None
        },
    }
}

/// Inbound message by channel (`whatsapp`, `api`) and kind (`text`, `audio`)
pub fn record_request(channel: &'static str, kind: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "channel" => channel, "kind" => kind).increment(1);
}

pub fn record_intent(intent: &'static str) {
    metrics::counter!(INTENTS_TOTAL, "intent" => intent).increment(1);
}

/// A run that ended with the apology reply
pub fn record_error(channel: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "channel" => channel).increment(1);
}

pub fn record_total_latency(channel: &'static str, elapsed: Duration) {
    metrics::histogram!(RESPONSE_SECONDS, "channel" => channel).record(elapsed.as_secs_f64());
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.as_ref() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled\n".to_string()),
    }
}
