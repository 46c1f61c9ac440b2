//! Retention boundary and atomicity properties over the public store
//! interface.

use std::{sync::Arc, time::Duration};

use beacon_api::{
    retention::{cutoff_at, store::Category, store::CATEGORIES},
    CleanupScheduler, InMemoryRetentionStore, RetentionConfig, RetentionStore, SchedulerTiming,
};
use beacon_core::RealClock;
use chrono::{Duration as ChronoDuration, Utc};

#[tokio::test]
async fn ninety_day_retention_prunes_91_day_old_and_keeps_89_day_old() {
    let store = InMemoryRetentionStore::new();
    let now = Utc::now();

    store.insert(Category::UserEvents, now - ChronoDuration::days(91));
    store.insert(Category::UserEvents, now - ChronoDuration::days(89));

    let counts = store.purge_expired(cutoff_at(now, 90)).await.unwrap();

    assert_eq!(counts.user_events, 1);
    assert_eq!(store.len(Category::UserEvents), 1);
}

#[tokio::test]
async fn record_stamped_exactly_at_the_cutoff_survives() {
    let store = InMemoryRetentionStore::new();
    let now = Utc::now();
    let cutoff = cutoff_at(now, 90);

    store.insert(Category::ServiceErrors, cutoff);

    let counts = store.purge_expired(cutoff).await.unwrap();

    assert_eq!(counts.service_errors, 0, "comparison is strict <, not <=");
    assert_eq!(store.len(Category::ServiceErrors), 1);
}

#[tokio::test]
async fn recorded_sessions_are_keyed_on_start_time() {
    let store = InMemoryRetentionStore::new();
    let now = Utc::now();

    // A session that started before the cutoff is pruned even though it may
    // have ended recently.
    store.insert(Category::RecordedSessions, now - ChronoDuration::days(120));

    let counts = store.purge_expired(cutoff_at(now, 90)).await.unwrap();
    assert_eq!(counts.recorded_sessions, 1);
}

#[tokio::test]
async fn scheduler_failure_leaves_the_store_intact_until_the_retry() {
    let store = Arc::new(InMemoryRetentionStore::new());
    let now = Utc::now();
    for category in CATEGORIES {
        store.insert(category, now - ChronoDuration::days(100));
    }
    store.fail_next_purge_at(Category::ServiceErrors);

    let timing = SchedulerTiming {
        startup_grace: Duration::from_millis(1),
        sweep_interval: Duration::from_secs(60),
        failure_retry: Duration::from_millis(15),
    };
    let config = RetentionConfig { retention_days: 90, interval_hours: 24, enabled: true };
    let scheduler =
        CleanupScheduler::with_timing(store.clone(), config, timing, Arc::new(RealClock));
    let token = scheduler.cancellation_token();
    let handle = scheduler.spawn();

    // First sweep fails and rolls back; give the shortened retry time to run.
    tokio::time::sleep(Duration::from_millis(40)).await;
    token.cancel();
    handle.await.unwrap();

    assert_eq!(store.purge_calls(), 2);
    assert!(store.is_empty(), "the retry sweep prunes everything the failed sweep left");
}
