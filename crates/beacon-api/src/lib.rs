//! Collector service for beacon telemetry.
//!
//! Exposes the HTTP ingestion and query surface over the telemetry store and
//! runs the retention cleanup scheduler that keeps the store within its
//! retention window. Request handling and retention never block each other:
//! the scheduler is a single supervised background task cancelled only at
//! shutdown.

use std::sync::Arc;

use beacon_core::{storage::Storage, Clock};

pub mod config;
pub mod error;
pub mod handlers;
pub mod retention;
pub mod server;

pub use config::Config;
pub use error::ApiError;
pub use retention::{
    scheduler::{CleanupScheduler, SchedulerTiming},
    store::{InMemoryRetentionStore, PostgresRetentionStore, RetentionStore},
    RetentionConfig,
};
pub use server::{create_router, start_server};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Telemetry store.
    pub storage: Storage,
    /// Time source for record timestamps and retention cutoffs.
    pub clock: Arc<dyn Clock>,
    /// Retention settings, fixed at startup.
    pub retention: RetentionConfig,
    /// Retention operations used by the manual cleanup trigger.
    pub retention_store: Arc<dyn RetentionStore>,
}

impl AppState {
    /// Creates state backed by the given store.
    pub fn new(storage: Storage, clock: Arc<dyn Clock>, retention: RetentionConfig) -> Self {
        let retention_store = Arc::new(PostgresRetentionStore::new(storage.clone()));
        Self { storage, clock, retention, retention_store }
    }

    /// Creates state with a custom retention store, for tests that exercise
    /// the cleanup trigger without a database.
    pub fn with_retention_store(
        storage: Storage,
        clock: Arc<dyn Clock>,
        retention: RetentionConfig,
        retention_store: Arc<dyn RetentionStore>,
    ) -> Self {
        Self { storage, clock, retention, retention_store }
    }
}
