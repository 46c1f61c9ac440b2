//! Repository for UI interaction event records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewUiEvent, UiEvent},
};

const COLUMNS: &str = "id, user_id, session_id, interaction_type, element_type, element_name, \
                       element_id, page_path, page_context, route_name, event_value, \
                       event_metadata, user_agent, viewport_width, viewport_height, device_type, \
                       time_to_interaction_ms, timestamp";

/// Query filters for listing UI events.
#[derive(Debug, Clone, Default)]
pub struct UiEventFilter {
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
    pub limit: i64,
}

/// Repository for UI event database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a new UI event stamped with the given time.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn insert(&self, event: &NewUiEvent, timestamp: DateTime<Utc>) -> Result<UiEvent> {
        let inserted = sqlx::query_as::<_, UiEvent>(&format!(
            "INSERT INTO ui_events (user_id, session_id, interaction_type, element_type, \
             element_name, element_id, page_path, page_context, route_name, event_value, \
             event_metadata, user_agent, viewport_width, viewport_height, device_type, \
             time_to_interaction_ms, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING {COLUMNS}"
        ))
        .bind(event.user_id)
        .bind(&event.session_id)
        .bind(&event.interaction_type)
        .bind(&event.element_type)
        .bind(&event.element_name)
        .bind(&event.element_id)
        .bind(&event.page_path)
        .bind(&event.page_context)
        .bind(&event.route_name)
        .bind(&event.event_value)
        .bind(&event.event_metadata)
        .bind(&event.user_agent)
        .bind(event.viewport_width)
        .bind(event.viewport_height)
        .bind(&event.device_type)
        .bind(event.time_to_interaction_ms)
        .bind(timestamp)
        .fetch_one(&*self.pool)
        .await?;

        Ok(inserted)
    }

    /// Lists UI events matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self, filter: &UiEventFilter) -> Result<Vec<UiEvent>> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM ui_events WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(session_id) = &filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id.clone());
        }
        if let Some(interaction_type) = &filter.interaction_type {
            query.push(" AND interaction_type = ").push_bind(interaction_type.clone());
        }
        if let Some(element_type) = &filter.element_type {
            query.push(" AND element_type = ").push_bind(element_type.clone());
        }
        if let Some(page_path) = &filter.page_path {
            query.push(" AND page_path = ").push_bind(page_path.clone());
        }
        if let Some(page_context) = &filter.page_context {
            query.push(" AND page_context = ").push_bind(page_context.clone());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }

        query.push(" ORDER BY timestamp DESC LIMIT ").push_bind(filter.limit.max(1));

        let events = query.build_query_as::<UiEvent>().fetch_all(&*self.pool).await?;

        Ok(events)
    }

    /// Total number of stored UI events.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM ui_events").fetch_one(&*self.pool).await?;

        Ok(count)
    }

    /// Timestamps of the oldest and newest stored UI events.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn timestamp_bounds(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let bounds = sqlx::query_as("SELECT MIN(timestamp), MAX(timestamp) FROM ui_events")
            .fetch_one(&*self.pool)
            .await?;

        Ok(bounds)
    }

    /// Number of UI events strictly older than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM ui_events WHERE timestamp < $1")
            .bind(cutoff)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
