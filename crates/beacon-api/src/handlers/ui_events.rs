//! UI interaction event ingestion and queries.

use axum::{
    extract::{Query, State},
    Json,
};
use beacon_core::{
    models::{NewUiEvent, UiEvent},
    storage::ui_events::UiEventFilter,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{error::ApiError, AppState};

/// Query parameters for `GET /ui-events`.
#[derive(Debug, Deserialize)]
pub struct UiEventsQuery {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one interaction kind.
    pub interaction_type: Option<String>,
    /// Restrict to one element kind.
    pub element_type: Option<String>,
    /// Restrict to one page.
    pub page_path: Option<String>,
    /// Restrict to one page context.
    pub page_context: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

/// `POST /ui-events` — stores a UI interaction event.
pub async fn create_ui_event(
    State(state): State<AppState>,
    Json(event): Json<NewUiEvent>,
) -> Result<Json<UiEvent>, ApiError> {
    let timestamp = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.ui_events.insert(&event, timestamp).await?;

    Ok(Json(stored))
}

/// `GET /ui-events` — queries stored UI events.
pub async fn list_ui_events(
    State(state): State<AppState>,
    Query(query): Query<UiEventsQuery>,
) -> Result<Json<Vec<UiEvent>>, ApiError> {
    let filter = UiEventFilter {
        user_id: query.user_id,
        session_id: query.session_id,
        interaction_type: query.interaction_type,
        element_type: query.element_type,
        page_path: query.page_path,
        page_context: query.page_context,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
    };

    let events = state.storage.ui_events.list(&filter).await?;
    Ok(Json(events))
}
