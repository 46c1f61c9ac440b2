//! Cross-table retention operations.
//!
//! A sweep touches five record categories — user events, UI events, UI
//! errors and service errors by `timestamp`, recorded sessions by
//! `started_at` — and must prune either all of them or none. `purge_expired`
//! therefore runs every count and delete inside a single transaction; any
//! failure rolls the whole sweep back. Aggregated user sessions are never
//! pruned.
//!
//! The cutoff comparison is strict `<`: a row stamped exactly at the cutoff
//! survives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::Result;

/// Tables pruned by the retention sweep, with their timestamp column.
const CATEGORIES: [(&str, &str); 5] = [
    ("user_events", "timestamp"),
    ("ui_events", "timestamp"),
    ("ui_errors", "timestamp"),
    ("service_errors", "timestamp"),
    ("recorded_sessions", "started_at"),
];

/// Per-category row counts from a sweep or a dry-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    /// User events counted or deleted.
    pub user_events: u64,
    /// UI events counted or deleted.
    pub ui_events: u64,
    /// UI errors counted or deleted.
    pub ui_errors: u64,
    /// Service errors counted or deleted.
    pub service_errors: u64,
    /// Recorded sessions counted or deleted.
    pub recorded_sessions: u64,
}

impl CategoryCounts {
    /// Sum across all categories.
    pub fn total(&self) -> u64 {
        self.user_events
            + self.ui_events
            + self.ui_errors
            + self.service_errors
            + self.recorded_sessions
    }

    /// Whether any category has a non-zero count.
    pub fn any(&self) -> bool {
        self.total() > 0
    }

    fn set(&mut self, table: &str, value: u64) {
        match table {
            "user_events" => self.user_events = value,
            "ui_events" => self.ui_events = value,
            "ui_errors" => self.ui_errors = value,
            "service_errors" => self.service_errors = value,
            "recorded_sessions" => self.recorded_sessions = value,
            _ => {},
        }
    }
}

/// Repository for retention sweeps over all pruned tables.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Counts rows strictly older than the cutoff in every pruned category
    /// without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns error if any count query fails.
    pub async fn count_expired(&self, cutoff: DateTime<Utc>) -> Result<CategoryCounts> {
        let mut counts = CategoryCounts::default();

        for (table, column) in CATEGORIES {
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} < $1"))
                    .bind(cutoff)
                    .fetch_one(&*self.pool)
                    .await?;

            counts.set(table, u64::try_from(count).unwrap_or(0));
        }

        Ok(counts)
    }

    /// Deletes rows strictly older than the cutoff in every pruned category.
    ///
    /// All five category deletes run in one transaction: a failure in any of
    /// them rolls back the entire sweep, leaving no category partially
    /// pruned.
    ///
    /// # Errors
    ///
    /// Returns error if the transaction fails; the store is unchanged in
    /// that case.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<CategoryCounts> {
        let mut tx = self.pool.begin().await?;
        let counts = purge_in_tx(&mut tx, cutoff).await?;
        tx.commit().await?;

        Ok(counts)
    }
}

async fn purge_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    cutoff: DateTime<Utc>,
) -> Result<CategoryCounts> {
    let mut counts = CategoryCounts::default();

    for (table, column) in CATEGORIES {
        // Count-then-delete: the count is part of the same transaction, so
        // the two always agree.
        let expired: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} < $1"))
                .bind(cutoff)
                .fetch_one(&mut **tx)
                .await?;

        let deleted = sqlx::query(&format!("DELETE FROM {table} WHERE {column} < $1"))
            .bind(cutoff)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug_assert_eq!(u64::try_from(expired).unwrap_or(0), deleted);
        counts.set(table, deleted);
    }

    Ok(counts)
}
