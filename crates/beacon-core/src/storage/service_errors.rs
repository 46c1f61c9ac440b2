//! Repository for backend/service error records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{NewServiceError, ServiceError},
};

const COLUMNS: &str = "id, user_id, session_id, error_message, error_type, status_code, \
                       severity, request_url, request_method, request_headers, request_body, \
                       response_body, response_headers, service_name, endpoint, request_id, \
                       error_code, timeout_ms, stack_trace, error_metadata, user_agent, \
                       ip_address, timestamp";

/// Query filters for listing service errors.
#[derive(Debug, Clone, Default)]
pub struct ServiceErrorFilter {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one reporting service.
    pub service_name: Option<String>,
    /// Restrict to one error class.
    pub error_type: Option<String>,
    /// Restrict to one HTTP status code.
    pub status_code: Option<i32>,
    /// Restrict to one severity (INFO, WARNING, ERROR).
    pub severity: Option<String>,
    /// Restrict to one logical endpoint.
    pub endpoint: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: i64,
}

/// Repository for service error database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a new service error with the resolved severity, stamped with
    /// the given time.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn insert(
        &self,
        error: &NewServiceError,
        severity: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<ServiceError> {
        let inserted = sqlx::query_as::<_, ServiceError>(&format!(
            "INSERT INTO service_errors (user_id, session_id, error_message, error_type, \
             status_code, severity, request_url, request_method, request_headers, request_body, \
             response_body, response_headers, service_name, endpoint, request_id, error_code, \
             timeout_ms, stack_trace, error_metadata, user_agent, ip_address, timestamp)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22)
             RETURNING {COLUMNS}"
        ))
        .bind(error.user_id)
        .bind(&error.session_id)
        .bind(&error.error_message)
        .bind(&error.error_type)
        .bind(error.status_code)
        .bind(severity)
        .bind(&error.request_url)
        .bind(&error.request_method)
        .bind(&error.request_headers)
        .bind(&error.request_body)
        .bind(&error.response_body)
        .bind(&error.response_headers)
        .bind(&error.service_name)
        .bind(&error.endpoint)
        .bind(&error.request_id)
        .bind(&error.error_code)
        .bind(error.timeout_ms)
        .bind(&error.stack_trace)
        .bind(&error.error_metadata)
        .bind(&error.user_agent)
        .bind(&error.ip_address)
        .bind(timestamp)
        .fetch_one(&*self.pool)
        .await?;

        Ok(inserted)
    }

    /// Lists service errors matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self, filter: &ServiceErrorFilter) -> Result<Vec<ServiceError>> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM service_errors WHERE TRUE"));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(session_id) = &filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id.clone());
        }
        if let Some(service_name) = &filter.service_name {
            query.push(" AND service_name = ").push_bind(service_name.clone());
        }
        if let Some(error_type) = &filter.error_type {
            query.push(" AND error_type = ").push_bind(error_type.clone());
        }
        if let Some(status_code) = filter.status_code {
            query.push(" AND status_code = ").push_bind(status_code);
        }
        if let Some(severity) = &filter.severity {
            query.push(" AND severity = ").push_bind(severity.to_uppercase());
        }
        if let Some(endpoint) = &filter.endpoint {
            query.push(" AND endpoint = ").push_bind(endpoint.clone());
        }
        if let Some(start) = filter.start_date {
            query.push(" AND timestamp >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND timestamp <= ").push_bind(end);
        }

        query.push(" ORDER BY timestamp DESC LIMIT ").push_bind(filter.limit.max(1));

        let errors = query.build_query_as::<ServiceError>().fetch_all(&*self.pool).await?;

        Ok(errors)
    }

    /// Total number of stored service errors.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM service_errors")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }

    /// Timestamps of the oldest and newest stored service errors.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn timestamp_bounds(
        &self,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let bounds = sqlx::query_as("SELECT MIN(timestamp), MAX(timestamp) FROM service_errors")
            .fetch_one(&*self.pool)
            .await?;

        Ok(bounds)
    }

    /// Number of service errors strictly older than the cutoff.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_older_than(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM service_errors WHERE timestamp < $1")
            .bind(cutoff)
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
