//! Repository for frontend error records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewUiError, UiError},
};

const COLUMNS: &str = "id, user_id, session_id, error_message, error_type, error_stack, \
                       error_source, line_number, column_number, page_path, page_context, \
                       route_name, error_metadata, user_agent, viewport_width, viewport_height, \
                       device_type, timestamp";

/// Query filters for listing UI errors.
#[derive(Debug, Clone, Default)]
pub struct UiErrorFilter {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one error class.
    pub error_type: Option<String>,
    /// Restrict to one page.
    pub page_path: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: i64,
}

/// Repository for UI error database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a new UI error stamped with the given time.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn insert(&self, error: &NewUiError, timestamp: DateTime<Utc>) -> Result<UiError> {
        let inserted = sqlx::query_as::<_, UiError>(&format!(
            "INSERT INTO ui_errors (user_id, session_id, error_message, error_type, error_stack, \
             error_source, line_number, column_number, page_path, page_context, route_name, \
             error_metadata, user_agent, viewport_width, viewport_height, device_type, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING {COLUMNS}"
        ))
        .bind(error.user_id)
        .bind(&error.session_id)
        .bind(&error.error_message)
        .bind(&error.error_type)
        .bind(&error.error_stack)
        .bind(&error.error_source)
        .bind(error.line_number)
        .bind(error.column_number)
        .bind(&error.page_path)
        .bind(&error.page_context)
        .bind(&error.route_name)
        .bind(&error.error_metadata)
        .bind(&error.user_agent)
        .bind(error.viewport_width)
        .bind(error.viewport_height)
        .bind(&error.device_type)
        .bind(timestamp)
        .fetch_one(&*self.pool)
        .await?;

        Ok(inserted)
    }

    /// Lists UI errors matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self, filter: &UiErrorFilter) -> Result<Vec<UiError>> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM ui_errors WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(session_id) = &filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id.clone());
        }
        if let Some(error_type) = &filter.error_type {
            query.push(" AND error_type = ").push_bind(error_type.clone());
        }
        if let Some(page_path) = &filter.page_path {
            query.push(" AND page_path = ").push_bind(page_path.clone());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }

        query.push(" ORDER BY timestamp DESC LIMIT ").push_bind(filter.limit.max(1));

        let errors = query.build_query_as::<UiError>().fetch_all(&*self.pool).await?;

        Ok(errors)
    }

    /// Total number of stored UI errors.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM ui_errors").fetch_one(&*self.pool).await?;

        Ok(count)
    }

    /// Timestamps of the oldest and newest stored UI errors.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn timestamp_bounds(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let bounds = sqlx::query_as("SELECT MIN(timestamp), MAX(timestamp) FROM ui_errors")
            .fetch_one(&*self.pool)
            .await?;

        Ok(bounds)
    }

    /// Number of UI errors strictly older than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM ui_errors WHERE timestamp < $1")
            .bind(cutoff)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
