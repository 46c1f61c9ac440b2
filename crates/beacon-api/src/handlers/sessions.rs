//! Recorded session lifecycle endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use beacon_core::models::{NewRecordedSession, RecordedSession};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::{error::ApiError, AppState};

/// Query parameters for `GET /sessions/record`.
#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    /// Maximum rows returned.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
    /// Whether still-running recordings are included.
    #[serde(default = "default_include_active")]
    pub include_active: bool,
}

fn default_include_active() -> bool {
    true
}

/// `POST /sessions/record` — starts recording a session.
pub async fn start_recorded_session(
    State(state): State<AppState>,
    Json(session): Json<NewRecordedSession>,
) -> Result<Json<RecordedSession>, ApiError> {
    let started_at = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.recorded_sessions.start(&session, started_at).await?;

    info!(session_id = stored.id, name = ?stored.name, "started recording session");
    Ok(Json(stored))
}

/// `POST /sessions/record/{id}/end` — ends an active recording, computing
/// its duration. Returns 404 for unknown sessions and 400 when the session
/// already ended.
pub async fn end_recorded_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    update: Option<Json<NewRecordedSession>>,
) -> Result<Json<RecordedSession>, ApiError> {
    let update = update.map(|Json(update)| update).unwrap_or_default();

    let ended_at = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.recorded_sessions.end(id, &update, ended_at).await?;

    info!(
        session_id = id,
        duration_seconds = ?stored.duration_seconds,
        "ended recording session"
    );
    Ok(Json(stored))
}

/// `GET /sessions/record` — lists recorded sessions.
pub async fn list_recorded_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<Vec<RecordedSession>>, ApiError> {
    let sessions =
        state.storage.recorded_sessions.list(query.limit, query.include_active).await?;
    Ok(Json(sessions))
}

/// `GET /sessions/record/{id}` — fetches one recorded session.
pub async fn get_recorded_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RecordedSession>, ApiError> {
    let session = state.storage.recorded_sessions.find(id).await?;
    Ok(Json(session))
}
