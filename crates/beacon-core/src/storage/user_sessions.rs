//! Repository for aggregated browsing sessions.
//!
//! Sessions are written by the analytics ingestion pipeline, not by the
//! collector's HTTP surface; the service only reports on them and the
//! retention sweep leaves them untouched.

use std::sync::Arc;

use sqlx::PgPool;

use crate::error::Result;

/// Repository for user session database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Total number of stored sessions.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM user_sessions")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
