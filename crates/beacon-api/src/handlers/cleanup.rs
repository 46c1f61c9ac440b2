//! Manual retention cleanup trigger.
//!
//! Exposes the same sweep the background scheduler runs, with an optional
//! retention override and a dry-run mode so operators can audit what a
//! destructive run would delete.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{error::ApiError, retention::cutoff_at, AppState};

/// Query parameters for `POST /cleanup`.
#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    /// Retention override in days; defaults to the configured retention.
    pub days: Option<u32>,
    /// Count what would be deleted without deleting.
    #[serde(default)]
    pub dry_run: bool,
}

/// `POST /cleanup` — runs (or previews) a retention sweep now.
pub async fn run_cleanup(
    State(state): State<AppState>,
    Query(params): Query<CleanupParams>,
) -> Result<Json<Value>, ApiError> {
    let retention_days = params.days.unwrap_or(state.retention.retention_days);
    let now = DateTime::<Utc>::from(state.clock.now_system());
    let cutoff = cutoff_at(now, retention_days);

    if params.dry_run {
        let counts = state
            .retention_store
            .count_expired(cutoff)
            .await
            .map_err(ApiError::from)?;

        return Ok(Json(json!({
            "status": "dry_run",
            "user_events_to_delete": counts.user_events,
            "ui_events_to_delete": counts.ui_events,
            "ui_errors_to_delete": counts.ui_errors,
            "service_errors_to_delete": counts.service_errors,
            "recorded_sessions_to_delete": counts.recorded_sessions,
            "total_to_delete": counts.total(),
            "cutoff_date": cutoff,
            "retention_days": retention_days,
        })));
    }

    let counts =
        state.retention_store.purge_expired(cutoff).await.map_err(ApiError::from)?;

    info!(
        total = counts.total(),
        cutoff = %cutoff,
        retention_days,
        "manual cleanup complete"
    );

    Ok(Json(json!({
        "status": "success",
        "deleted_user_events": counts.user_events,
        "deleted_ui_events": counts.ui_events,
        "deleted_ui_errors": counts.ui_errors,
        "deleted_service_errors": counts.service_errors,
        "deleted_recorded_sessions": counts.recorded_sessions,
        "total_deleted": counts.total(),
        "cutoff_date": cutoff,
        "retention_days": retention_days,
    })))
}
