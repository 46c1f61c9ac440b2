//! Database access layer for telemetry records.
//!
//! Repository pattern: one repository per table, all sharing a single
//! connection pool. Every database operation goes through these
//! repositories; handlers and background jobs never issue raw SQL.

use std::sync::Arc;

use sqlx::PgPool;

pub mod recorded_sessions;
pub mod retention;
pub mod service_errors;
pub mod ui_errors;
pub mod ui_events;
pub mod user_events;
pub mod user_sessions;

use crate::error::Result;

/// Container for all repository instances providing unified database access.
#[derive(Clone)]
pub struct Storage {
    /// Repository for user-behavior events.
    pub user_events: Arc<user_events::Repository>,

    /// Repository for UI interaction events.
    pub ui_events: Arc<ui_events::Repository>,

    /// Repository for frontend errors.
    pub ui_errors: Arc<ui_errors::Repository>,

    /// Repository for backend/service errors.
    pub service_errors: Arc<service_errors::Repository>,

    /// Repository for recorded debugging sessions.
    pub recorded_sessions: Arc<recorded_sessions::Repository>,

    /// Repository for aggregated browsing sessions.
    pub user_sessions: Arc<user_sessions::Repository>,

    /// Cross-table retention operations (transactional sweep).
    pub retention: Arc<retention::Repository>,
}

impl Storage {
    /// Creates a new storage instance over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self {
            user_events: Arc::new(user_events::Repository::new(pool.clone())),
            ui_events: Arc::new(ui_events::Repository::new(pool.clone())),
            ui_errors: Arc::new(ui_errors::Repository::new(pool.clone())),
            service_errors: Arc::new(service_errors::Repository::new(pool.clone())),
            recorded_sessions: Arc::new(recorded_sessions::Repository::new(pool.clone())),
            user_sessions: Arc::new(user_sessions::Repository::new(pool.clone())),
            retention: Arc::new(retention::Repository::new(pool)),
        }
    }

    /// Verifies database connectivity with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) =
            sqlx::query_as("SELECT 1").fetch_one(&*self.user_events.pool()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        // Instantiation only; queries are covered by integration tests.
        let pool = PgPool::connect_lazy("postgresql://localhost/beacon_test").unwrap();
        let _storage = Storage::new(pool);
    }
}
