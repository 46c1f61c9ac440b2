//! Storage abstraction for retention sweeps.
//!
//! The scheduler and the manual cleanup trigger reach the store through
//! [`RetentionStore`], so sweep logic is testable without a database. The
//! production implementation delegates to the transactional sweep in
//! `beacon_core::storage::retention`; the in-memory double reproduces its
//! all-or-nothing semantics for deterministic tests.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::Duration,
};

use beacon_core::{error::Result, storage::Storage, CategoryCounts, CoreError};
use chrono::{DateTime, Utc};

/// Record categories pruned by a sweep, in sweep order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// User-behavior events, keyed by `timestamp`.
    UserEvents,
    /// UI interaction events, keyed by `timestamp`.
    UiEvents,
    /// Frontend errors, keyed by `timestamp`.
    UiErrors,
    /// Backend errors, keyed by `timestamp`.
    ServiceErrors,
    /// Recorded sessions, keyed by `started_at`.
    RecordedSessions,
}

/// All categories in the order a sweep visits them.
pub const CATEGORIES: [Category; 5] = [
    Category::UserEvents,
    Category::UiEvents,
    Category::UiErrors,
    Category::ServiceErrors,
    Category::RecordedSessions,
];

/// Store operations required by the retention sweep.
pub trait RetentionStore: Send + Sync + 'static {
    /// Counts rows strictly older than the cutoff in every category,
    /// deleting nothing.
    fn count_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>>;

    /// Deletes rows strictly older than the cutoff in every category as one
    /// atomic unit: either all categories are pruned or none are.
    fn purge_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>>;
}

/// Production retention store over PostgreSQL.
pub struct PostgresRetentionStore {
    storage: Storage,
}

impl PostgresRetentionStore {
    /// Creates a store over the given storage layer.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

impl RetentionStore for PostgresRetentionStore {
    fn count_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>> {
        let retention = self.storage.retention.clone();
        Box::pin(async move { retention.count_expired(cutoff).await })
    }

    fn purge_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>> {
        let retention = self.storage.retention.clone();
        Box::pin(async move { retention.purge_expired(cutoff).await })
    }
}

#[derive(Debug, Default, Clone)]
struct Tables {
    user_events: Vec<DateTime<Utc>>,
    ui_events: Vec<DateTime<Utc>>,
    ui_errors: Vec<DateTime<Utc>>,
    service_errors: Vec<DateTime<Utc>>,
    recorded_sessions: Vec<DateTime<Utc>>,
}

impl Tables {
    fn rows_mut(&mut self, category: Category) -> &mut Vec<DateTime<Utc>> {
        match category {
            Category::UserEvents => &mut self.user_events,
            Category::UiEvents => &mut self.ui_events,
            Category::UiErrors => &mut self.ui_errors,
            Category::ServiceErrors => &mut self.service_errors,
            Category::RecordedSessions => &mut self.recorded_sessions,
        }
    }

    fn rows(&self, category: Category) -> &Vec<DateTime<Utc>> {
        match category {
            Category::UserEvents => &self.user_events,
            Category::UiEvents => &self.ui_events,
            Category::UiErrors => &self.ui_errors,
            Category::ServiceErrors => &self.service_errors,
            Category::RecordedSessions => &self.recorded_sessions,
        }
    }
}

/// In-memory retention store for tests.
///
/// Rows are bare timestamps per category. Sweeps are staged and applied
/// only when every category succeeds, matching the transactional rollback
/// of the PostgreSQL implementation. Failure injection targets a category
/// index so atomicity can be exercised mid-sweep.
#[derive(Debug, Default)]
pub struct InMemoryRetentionStore {
    tables: Mutex<Tables>,
    fail_remaining: Mutex<Vec<Category>>,
    sweep_delay: Mutex<Duration>,
    purge_calls: AtomicU64,
}

impl InMemoryRetentionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row with the given timestamp.
    pub fn insert(&self, category: Category, timestamp: DateTime<Utc>) {
        self.tables.lock().expect("store lock").rows_mut(category).push(timestamp);
    }

    /// Current row count in one category.
    pub fn len(&self, category: Category) -> usize {
        self.tables.lock().expect("store lock").rows(category).len()
    }

    /// Whether every category is empty.
    pub fn is_empty(&self) -> bool {
        CATEGORIES.iter().all(|&category| self.len(category) == 0)
    }

    /// Makes the next purge fail when it reaches `category`, once.
    pub fn fail_next_purge_at(&self, category: Category) {
        self.fail_remaining.lock().expect("store lock").push(category);
    }

    /// Adds artificial latency to every purge, to let tests cancel
    /// mid-sweep.
    pub fn set_sweep_delay(&self, delay: Duration) {
        *self.sweep_delay.lock().expect("store lock") = delay;
    }

    /// Number of purge attempts made, including failed ones.
    pub fn purge_calls(&self) -> u64 {
        self.purge_calls.load(Ordering::Relaxed)
    }

    fn counts_at(tables: &Tables, cutoff: DateTime<Utc>) -> CategoryCounts {
        let expired =
            |rows: &Vec<DateTime<Utc>>| rows.iter().filter(|ts| **ts < cutoff).count() as u64;

        CategoryCounts {
            user_events: expired(&tables.user_events),
            ui_events: expired(&tables.ui_events),
            ui_errors: expired(&tables.ui_errors),
            service_errors: expired(&tables.service_errors),
            recorded_sessions: expired(&tables.recorded_sessions),
        }
    }
}

impl RetentionStore for InMemoryRetentionStore {
    fn count_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>> {
        Box::pin(async move {
            let tables = self.tables.lock().expect("store lock");
            Ok(Self::counts_at(&tables, cutoff))
        })
    }

    fn purge_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<CategoryCounts>> + Send + '_>> {
        Box::pin(async move {
            self.purge_calls.fetch_add(1, Ordering::Relaxed);

            let delay = *self.sweep_delay.lock().expect("store lock");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let fail_at = self.fail_remaining.lock().expect("store lock").pop();

            let mut tables = self.tables.lock().expect("store lock");
            let counts = Self::counts_at(&tables, cutoff);

            // Stage deletions; commit only if every category survives.
            let mut staged = tables.clone();
            for category in CATEGORIES {
                if fail_at == Some(category) {
                    return Err(CoreError::Database(format!(
                        "injected failure pruning {category:?}"
                    )));
                }
                staged.rows_mut(category).retain(|ts| *ts >= cutoff);
            }

            *tables = staged;
            Ok(counts)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    #[tokio::test]
    async fn purge_uses_strict_less_than_comparison() {
        let store = InMemoryRetentionStore::new();
        let cutoff = Utc::now();

        store.insert(Category::UserEvents, cutoff - ChronoDuration::seconds(1));
        store.insert(Category::UserEvents, cutoff); // exactly at the cutoff
        store.insert(Category::UserEvents, cutoff + ChronoDuration::seconds(1));

        let counts = store.purge_expired(cutoff).await.unwrap();

        assert_eq!(counts.user_events, 1);
        assert_eq!(store.len(Category::UserEvents), 2);
    }

    #[tokio::test]
    async fn failed_purge_leaves_every_category_unchanged() {
        let store = InMemoryRetentionStore::new();
        let cutoff = Utc::now();
        let old = cutoff - ChronoDuration::days(1);

        for category in CATEGORIES {
            store.insert(category, old);
        }

        // Fail on the fourth of five categories.
        store.fail_next_purge_at(Category::ServiceErrors);
        let result = store.purge_expired(cutoff).await;
        assert!(result.is_err());

        for category in CATEGORIES {
            assert_eq!(store.len(category), 1, "{category:?} must be untouched after rollback");
        }

        // The next sweep succeeds and prunes everything.
        let counts = store.purge_expired(cutoff).await.unwrap();
        assert_eq!(counts.total(), 5);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn dry_run_counts_match_purge_without_deleting() {
        let store = InMemoryRetentionStore::new();
        let cutoff = Utc::now();

        store.insert(Category::UiEvents, cutoff - ChronoDuration::days(2));
        store.insert(Category::UiErrors, cutoff - ChronoDuration::days(3));
        store.insert(Category::UiErrors, cutoff + ChronoDuration::days(1));

        let counted = store.count_expired(cutoff).await.unwrap();
        assert_eq!(counted.ui_events, 1);
        assert_eq!(counted.ui_errors, 1);
        assert_eq!(store.len(Category::UiEvents), 1);
        assert_eq!(store.len(Category::UiErrors), 2);

        let purged = store.purge_expired(cutoff).await.unwrap();
        assert_eq!(purged, counted);
    }
}
