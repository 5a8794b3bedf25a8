//! HTTP surface of the serving container.
//!
//! The hosting contract is three routes: `GET /ping` (readiness),
//! `POST /invocations` (one inference request), `GET /metrics`
//! (Prometheus text). Request failures map to status codes here; they
//! never crash the process.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use hark_handler::{transform, HandlerError, ObjectStore};
use hark_transcription::SpeechEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::metrics::{INVOCATIONS_TOTAL, INVOCATION_ERRORS_TOTAL};

/// Maximum request body size (50 MB of inline media).
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared per-process state: the engine is loaded once and used
/// read-only by every request.
#[derive(Clone)]
pub struct AppState {
    /// The transcription engine bound at startup.
    pub engine: Arc<dyn SpeechEngine>,
    /// Object store for RemoteReference downloads.
    pub store: Arc<dyn ObjectStore>,
    /// Handle for rendering `/metrics`.
    pub metrics: PrometheusHandle,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .route("/metrics", get(render_metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Readiness probe. The engine is constructed before the listener
/// binds, so reaching this handler at all means the model is loaded.
async fn ping() -> StatusCode {
    StatusCode::OK
}

async fn render_metrics(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}

/// One inference request: body in, serialized transcription out.
///
/// `Content-Type` drives variant detection; `Accept`, when present and
/// specific, selects the response content type.
async fn invocations(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    metrics::counter!(INVOCATIONS_TOTAL).increment(1);

    let request_content_type = header_str(&headers, &header::CONTENT_TYPE);
    let accept = header_str(&headers, &header::ACCEPT).filter(|a| *a != "*/*");

    match transform(
        state.engine.as_ref(),
        state.store.as_ref(),
        &body,
        request_content_type,
        accept,
    )
    .await
    {
        Ok((serialized, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], serialized).into_response()
        }
        Err(err) => error_response(&err),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Map a handler failure onto the container's fault-reporting
/// convention: status code + structured JSON error body.
fn error_response(err: &HandlerError) -> Response {
    let (status, error_type) = match err {
        e if e.is_input_error() => (StatusCode::BAD_REQUEST, "input"),
        HandlerError::Storage(_) => (StatusCode::BAD_GATEWAY, "storage"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "engine"),
    };
    warn!(error = %err, error_type, "invocation failed");
    metrics::counter!(INVOCATION_ERRORS_TOTAL, "error_type" => error_type).increment(1);

    let body = serde_json::json!({ "error": err.to_string() }).to_string();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
