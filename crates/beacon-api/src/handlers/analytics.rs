//! Analytics summary and store introspection endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{error::ApiError, retention::cutoff_at, AppState};

/// Query parameters for `GET /analytics/summary`.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Inclusive lower timestamp bound; defaults to seven days ago.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound; defaults to now.
    pub end_date: Option<DateTime<Utc>>,
}

/// `GET /analytics/summary` — event totals for a time range, defaulting to
/// the trailing seven days.
pub async fn analytics_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, ApiError> {
    let now = DateTime::<Utc>::from(state.clock.now_system());
    let end = query.end_date.unwrap_or(now);
    let start = query.start_date.unwrap_or(end - Duration::days(7));

    let events = &state.storage.user_events;
    let total_events = events.count_between(start, end).await?;
    let unique_users = events.count_distinct_users_between(start, end).await?;
    let event_types = events.counts_by_event_type(start, end).await?;

    Ok(Json(json!({
        "total_events": total_events,
        "unique_users": unique_users,
        "event_types": counts_to_map(event_types),
        "start_date": start,
        "end_date": end,
    })))
}

/// `GET /stats` — store-wide totals, timestamp bounds and retention debt.
/// This is the operator's window into cleanup behavior between sweeps.
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let storage = &state.storage;

    let total_events = storage.user_events.count().await?;
    let total_ui_events = storage.ui_events.count().await?;
    let total_ui_errors = storage.ui_errors.count().await?;
    let total_service_errors = storage.service_errors.count().await?;
    let total_sessions = storage.user_sessions.count().await?;
    let total_recorded_sessions = storage.recorded_sessions.count().await?;

    let (oldest_event, newest_event) = storage.user_events.timestamp_bounds().await?;
    let (oldest_ui_event, newest_ui_event) = storage.ui_events.timestamp_bounds().await?;
    let (oldest_ui_error, newest_ui_error) = storage.ui_errors.timestamp_bounds().await?;
    let (oldest_service_error, newest_service_error) =
        storage.service_errors.timestamp_bounds().await?;

    let now = DateTime::<Utc>::from(state.clock.now_system());
    let cutoff = cutoff_at(now, state.retention.retention_days);
    let expired_events = storage.user_events.count_older_than(cutoff).await?;
    let expired_ui_events = storage.ui_events.count_older_than(cutoff).await?;
    let expired_ui_errors = storage.ui_errors.count_older_than(cutoff).await?;
    let expired_service_errors = storage.service_errors.count_older_than(cutoff).await?;

    let categories = storage.user_events.counts_by_category().await?;

    // Rough size estimate at ~500 bytes per record.
    let record_total = total_events + total_ui_events + total_ui_errors + total_service_errors;
    let estimated_size_mb = (record_total as f64 * 500.0) / (1024.0 * 1024.0);

    Ok(Json(json!({
        "total_events": total_events,
        "total_ui_events": total_ui_events,
        "total_ui_errors": total_ui_errors,
        "total_service_errors": total_service_errors,
        "total_errors": total_ui_errors + total_service_errors,
        "total_sessions": total_sessions,
        "total_recorded_sessions": total_recorded_sessions,
        "oldest_event": oldest_event,
        "newest_event": newest_event,
        "oldest_ui_event": oldest_ui_event,
        "newest_ui_event": newest_ui_event,
        "oldest_ui_error": oldest_ui_error,
        "newest_ui_error": newest_ui_error,
        "oldest_service_error": oldest_service_error,
        "newest_service_error": newest_service_error,
        "events_by_category": counts_to_map(categories),
        "retention_days": state.retention.retention_days,
        "events_older_than_retention": expired_events,
        "ui_events_older_than_retention": expired_ui_events,
        "ui_errors_older_than_retention": expired_ui_errors,
        "service_errors_older_than_retention": expired_service_errors,
        "estimated_size_mb": (estimated_size_mb * 100.0).round() / 100.0,
        "auto_cleanup_enabled": state.retention.enabled,
        "cleanup_interval_hours": state.retention.interval_hours,
    })))
}

fn counts_to_map(counts: Vec<(String, i64)>) -> Value {
    let mut map = Map::new();
    for (key, count) in counts {
        map.insert(key, Value::from(count));
    }
    Value::Object(map)
}
