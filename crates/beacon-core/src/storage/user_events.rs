//! Repository for user-behavior event records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewUserEvent, UserEvent},
};

const COLUMNS: &str = "id, user_id, session_id, event_type, event_category, timestamp, \
                       event_metadata, user_agent, ip_address, service_name, request_id";

/// Query filters for listing user events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one event type.
    pub event_type: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: i64,
}

/// Repository for user event database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns the shared database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a new user event stamped with the given time.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn insert(&self, event: &NewUserEvent, timestamp: DateTime<Utc>) -> Result<UserEvent> {
        let inserted = sqlx::query_as::<_, UserEvent>(&format!(
            "INSERT INTO user_events (user_id, session_id, event_type, event_category, timestamp, \
             event_metadata, user_agent, ip_address, service_name, request_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        ))
        .bind(event.user_id)
        .bind(&event.session_id)
        .bind(&event.event_type)
        .bind(&event.event_category)
        .bind(timestamp)
        .bind(&event.event_metadata)
        .bind(&event.user_agent)
        .bind(&event.ip_address)
        .bind(&event.service_name)
        .bind(&event.request_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(inserted)
    }

    /// Lists events matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<UserEvent>> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM user_events WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(event_type) = &filter.event_type {
            query.push(" AND event_type = ").push_bind(event_type.clone());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }

        query.push(" ORDER BY timestamp DESC LIMIT ").push_bind(filter.limit.max(1));

        let events = query.build_query_as::<UserEvent>().fetch_all(&*self.pool).await?;

        Ok(events)
    }

    /// Total number of stored events.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_events")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }

    /// Number of events within the given time range.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_events WHERE timestamp >= $1 AND timestamp <= $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&*self.pool)
        .await?;

        Ok(count)
    }

    /// Number of distinct users active within the given time range.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_distinct_users_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT user_id) FROM user_events
             WHERE user_id IS NOT NULL AND timestamp >= $1 AND timestamp <= $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&*self.pool)
        .await?;

        Ok(count)
    }

    /// Per-event-type counts within the given time range.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn counts_by_event_type(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as(
            "SELECT event_type, COUNT(*) FROM user_events
             WHERE timestamp >= $1 AND timestamp <= $2
             GROUP BY event_type",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-category counts across all stored events (NULL categories skipped).
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn counts_by_category(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as(
            "SELECT event_category, COUNT(*) FROM user_events
             WHERE event_category IS NOT NULL
             GROUP BY event_category",
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows)
    }

    /// Timestamps of the oldest and newest stored events.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn timestamp_bounds(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let bounds = sqlx::query_as("SELECT MIN(timestamp), MAX(timestamp) FROM user_events")
            .fetch_one(&*self.pool)
            .await?;

        Ok(bounds)
    }

    /// Number of events strictly older than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_events WHERE timestamp < $1")
            .bind(cutoff)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
