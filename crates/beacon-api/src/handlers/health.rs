//! Health check endpoint.

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use tracing::error;

use crate::AppState;

/// `GET /health` — service liveness plus a lightweight database
/// connectivity check. Called frequently by probes and by tracking clients,
/// so it stays cheap.
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.storage.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "beacon-collector",
                "database": "up",
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "beacon-collector",
                    "database": "down",
                })),
            )
                .into_response()
        },
    }
}
