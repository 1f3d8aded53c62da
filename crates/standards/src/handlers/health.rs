//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Cache counters, outbox backlog and backends
//! - `/readyz` - Readiness probe (storage round trip)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Passive stats, no storage round trip besides the backlog count.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    let outbox_pending = match state.outbox.count_pending().await {
        Ok(count) => json!(count),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count pending outbox messages");
            serde_json::Value::Null
        }
    };

    Json(json!({
        "backends": state.backends,
        "cache": state.cache.stats(),
        "outbox_pending": outbox_pending,
        "event_history_size": state.history.len(),
    }))
    .into_response()
}

/// GET /readyz - Readiness probe.
///
/// Returns 200 when the storage answers, 503 otherwise.
#[axum::debug_handler]
pub async fn readyz(State(state): State<AppState>) -> Response {
    match state.outbox.count_pending().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "ready": true }))).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ready": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
