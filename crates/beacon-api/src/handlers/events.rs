//! User event ingestion and queries.

use axum::{
    extract::{Query, State},
    Json,
};
use beacon_core::{
    models::{NewUserEvent, UserEvent},
    storage::user_events::EventFilter,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::{error::ApiError, AppState};

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one event type.
    pub event_type: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

/// `POST /events` — stores a user-behavior event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(event): Json<NewUserEvent>,
) -> Result<Json<UserEvent>, ApiError> {
    info!(event_type = %event.event_type, user_id = ?event.user_id, "creating event");

    let timestamp = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.user_events.insert(&event, timestamp).await?;

    Ok(Json(stored))
}

/// `GET /events` — queries stored events.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<UserEvent>>, ApiError> {
    let filter = EventFilter {
        user_id: query.user_id,
        event_type: query.event_type,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
    };

    let events = state.storage.user_events.list(&filter).await?;
    Ok(Json(events))
}
