//! Background retention cleanup scheduler.
//!
//! Lifecycle: `Stopped -> Starting -> Running -> Stopped`. On startup the
//! scheduler waits a grace period so the service can finish booting before
//! competing for the store, then loops forever: run one sweep, sleep the
//! configured interval, repeat. A failed sweep is retried after a single
//! shortened wait — retention debt is accumulating — before the normal
//! cadence resumes.
//!
//! Cancellation is observed at every sleep point and is never swallowed by
//! the failure path. An in-flight sweep is always allowed to finish and
//! commit; only the next sweep is prevented.

use std::{sync::Arc, time::Duration};

use beacon_core::Clock;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::{cutoff_at, store::RetentionStore, RetentionConfig};

/// Wait durations used by the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerTiming {
    /// Wait before the first sweep after startup.
    pub startup_grace: Duration,
    /// Wait between successful sweeps.
    pub sweep_interval: Duration,
    /// Shortened wait after a failed sweep.
    pub failure_retry: Duration,
}

impl SchedulerTiming {
    /// Production timing: 60s grace, the configured interval, 1h failure
    /// retry.
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            startup_grace: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(config.interval_hours.saturating_mul(3600)),
            failure_retry: Duration::from_secs(3600),
        }
    }
}

/// Periodic, cancellable retention sweep loop.
pub struct CleanupScheduler {
    store: Arc<dyn RetentionStore>,
    config: RetentionConfig,
    timing: SchedulerTiming,
    clock: Arc<dyn Clock>,
    cancellation_token: CancellationToken,
}

impl CleanupScheduler {
    /// Creates a scheduler with production timing.
    pub fn new(
        store: Arc<dyn RetentionStore>,
        config: RetentionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timing = SchedulerTiming::from_config(&config);
        Self::with_timing(store, config, timing, clock)
    }

    /// Creates a scheduler with explicit timing, for tests.
    pub fn with_timing(
        store: Arc<dyn RetentionStore>,
        config: RetentionConfig,
        timing: SchedulerTiming,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, config, timing, clock, cancellation_token: CancellationToken::new() }
    }

    /// Token that stops the loop; a pending sleep is interrupted and no new
    /// sweep starts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Spawns the scheduler as a supervised background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the scheduler until cancelled.
    pub async fn run(self) {
        if !self.config.enabled {
            info!("retention cleanup disabled by configuration");
            return;
        }

        info!(
            retention_days = self.config.retention_days,
            interval_hours = self.config.interval_hours,
            "starting retention cleanup scheduler"
        );

        // Starting: let the service boot before the first sweep.
        if self.wait(self.timing.startup_grace).await {
            info!("retention cleanup scheduler stopped before first sweep");
            return;
        }

        let mut short_retry_available = true;

        loop {
            let delay = match self.run_sweep().await {
                Ok(()) => {
                    short_retry_available = true;
                    self.timing.sweep_interval
                },
                Err(()) if short_retry_available => {
                    // One tightened retry per failure streak.
                    short_retry_available = false;
                    self.timing.failure_retry
                },
                Err(()) => self.timing.sweep_interval,
            };

            if self.wait(delay).await {
                break;
            }
        }

        info!("retention cleanup scheduler stopped");
    }

    /// Runs one sweep to completion. Failures are logged, not propagated;
    /// the caller only needs success-or-not for pacing.
    async fn run_sweep(&self) -> Result<(), ()> {
        let now: DateTime<Utc> = self.clock.now_system().into();
        let cutoff = cutoff_at(now, self.config.retention_days);

        match self.store.purge_expired(cutoff).await {
            Ok(counts) => {
                if counts.any() {
                    info!(
                        user_events = counts.user_events,
                        ui_events = counts.ui_events,
                        ui_errors = counts.ui_errors,
                        service_errors = counts.service_errors,
                        recorded_sessions = counts.recorded_sessions,
                        total = counts.total(),
                        cutoff = %cutoff,
                        "retention sweep complete"
                    );
                } else {
                    debug!(cutoff = %cutoff, "retention sweep complete, nothing to delete");
                }
                Ok(())
            },
            Err(e) => {
                error!(
                    error = %e,
                    cutoff = %cutoff,
                    retry_in_seconds = self.timing.failure_retry.as_secs(),
                    "retention sweep failed, store rolled back"
                );
                Err(())
            },
        }
    }

    /// Sleeps for `delay`, returning `true` if cancellation interrupted the
    /// sleep.
    async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            () = self.clock.sleep(delay) => false,
            () = self.cancellation_token.cancelled() => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use beacon_core::RealClock;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::retention::store::{Category, InMemoryRetentionStore, CATEGORIES};

    fn fast_timing() -> SchedulerTiming {
        SchedulerTiming {
            startup_grace: Duration::from_millis(5),
            sweep_interval: Duration::from_millis(40),
            failure_retry: Duration::from_millis(15),
        }
    }

    fn scheduler_for(
        store: Arc<InMemoryRetentionStore>,
        timing: SchedulerTiming,
    ) -> CleanupScheduler {
        let config = RetentionConfig { retention_days: 90, interval_hours: 24, enabled: true };
        CleanupScheduler::with_timing(store, config, timing, Arc::new(RealClock))
    }

    #[tokio::test]
    async fn sweeps_prune_expired_rows_and_keep_fresh_ones() {
        let store = Arc::new(InMemoryRetentionStore::new());
        let now = Utc::now();
        store.insert(Category::UserEvents, now - ChronoDuration::days(91));
        store.insert(Category::UserEvents, now - ChronoDuration::days(89));
        store.insert(Category::RecordedSessions, now - ChronoDuration::days(120));

        let scheduler = scheduler_for(store.clone(), fast_timing());
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(25)).await;
        token.cancel();
        handle.await.unwrap();

        assert!(store.purge_calls() >= 1);
        assert_eq!(store.len(Category::UserEvents), 1, "89-day-old record must survive");
        assert_eq!(store.len(Category::RecordedSessions), 0);
    }

    #[tokio::test]
    async fn cancelling_during_grace_period_prevents_any_sweep() {
        let store = Arc::new(InMemoryRetentionStore::new());
        let timing = SchedulerTiming {
            startup_grace: Duration::from_secs(60),
            ..fast_timing()
        };

        let scheduler = scheduler_for(store.clone(), timing);
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(store.purge_calls(), 0);
    }

    #[tokio::test]
    async fn cancelling_between_sweeps_stops_the_loop() {
        let store = Arc::new(InMemoryRetentionStore::new());
        let timing = SchedulerTiming {
            startup_grace: Duration::from_millis(1),
            sweep_interval: Duration::from_secs(60),
            failure_retry: Duration::from_secs(60),
        };

        let scheduler = scheduler_for(store.clone(), timing);
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        // First sweep runs, then the loop sleeps its long interval.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.purge_calls(), 1);

        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.purge_calls(), 1, "no sweep may start after cancellation");
    }

    #[tokio::test]
    async fn cancelling_mid_sweep_lets_it_finish_and_commit() {
        let store = Arc::new(InMemoryRetentionStore::new());
        store.insert(Category::UiEvents, Utc::now() - ChronoDuration::days(100));
        store.set_sweep_delay(Duration::from_millis(50));

        let timing = SchedulerTiming {
            startup_grace: Duration::from_millis(1),
            sweep_interval: Duration::from_secs(60),
            failure_retry: Duration::from_secs(60),
        };

        let scheduler = scheduler_for(store.clone(), timing);
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        // Cancel while the first sweep is still inside the store call.
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(store.purge_calls(), 1);
        assert_eq!(store.len(Category::UiEvents), 0, "in-flight sweep must commit");
    }

    #[tokio::test]
    async fn failed_sweep_retries_once_on_the_shortened_interval() {
        let store = Arc::new(InMemoryRetentionStore::new());
        store.fail_next_purge_at(Category::UserEvents);

        let timing = SchedulerTiming {
            startup_grace: Duration::from_millis(1),
            sweep_interval: Duration::from_secs(60),
            failure_retry: Duration::from_millis(10),
        };

        let scheduler = scheduler_for(store.clone(), timing);
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        // Failure at ~1ms, shortened retry at ~11ms succeeds; the next sweep
        // would only come after the 60s interval.
        tokio::time::sleep(Duration::from_millis(40)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(store.purge_calls(), 2);
    }

    #[tokio::test]
    async fn repeated_failures_fall_back_to_the_normal_interval() {
        let store = Arc::new(InMemoryRetentionStore::new());
        // Two consecutive failures: the first earns the shortened retry, the
        // second must wait the full interval.
        store.fail_next_purge_at(Category::UserEvents);
        store.fail_next_purge_at(Category::UserEvents);

        let timing = SchedulerTiming {
            startup_grace: Duration::from_millis(1),
            sweep_interval: Duration::from_secs(60),
            failure_retry: Duration::from_millis(10),
        };

        let scheduler = scheduler_for(store.clone(), timing);
        let token = scheduler.cancellation_token();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(store.purge_calls(), 2, "third sweep waits the normal interval");
    }

    #[tokio::test]
    async fn disabled_scheduler_never_sweeps() {
        let store = Arc::new(InMemoryRetentionStore::new());
        let config = RetentionConfig { enabled: false, ..RetentionConfig::default() };
        let scheduler = CleanupScheduler::with_timing(
            store.clone(),
            config,
            fast_timing(),
            Arc::new(RealClock),
        );

        scheduler.run().await;
        assert_eq!(store.purge_calls(), 0);
    }

    #[test]
    fn production_timing_matches_contract() {
        let config = RetentionConfig { retention_days: 90, interval_hours: 24, enabled: true };
        let timing = SchedulerTiming::from_config(&config);

        assert_eq!(timing.startup_grace, Duration::from_secs(60));
        assert_eq!(timing.sweep_interval, Duration::from_secs(24 * 3600));
        assert_eq!(timing.failure_retry, Duration::from_secs(3600));
    }

    #[test]
    fn all_five_categories_are_swept() {
        assert_eq!(CATEGORIES.len(), 5);
    }
}
