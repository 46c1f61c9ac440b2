//! Clock abstraction for testable timing.
//!
//! Every component that sleeps (retry backoff, the retention scheduler's
//! grace period and inter-sweep waits) or reads "now" (retention cutoffs,
//! record timestamps) goes through [`Clock`], so tests can run those code
//! paths without real waiting.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

/// Time source injected into anything that sleeps or timestamps.
///
/// Production code uses [`RealClock`]; tests inject [`TestClock`] to advance
/// virtual time immediately.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant for duration measurements.
    fn now(&self) -> Instant;

    /// Current system time for timestamps.
    fn now_system(&self) -> SystemTime;

    /// Sleeps for the given duration.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by system time and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_system(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Controllable clock for deterministic tests.
///
/// `sleep` advances the virtual clock instead of waiting, so a retry chain
/// with seconds of backoff or a scheduler with an hour-long interval runs to
/// completion immediately while still observing the durations it slept.
#[derive(Debug, Clone)]
pub struct TestClock {
    /// Virtual monotonic time, nanoseconds since construction.
    elapsed_ns: Arc<AtomicU64>,
    /// Virtual system time, nanoseconds since `UNIX_EPOCH`.
    system_ns: Arc<AtomicU64>,
    /// Total virtual time spent in `sleep`.
    slept_ns: Arc<AtomicU64>,
    base_instant: Instant,
}

impl TestClock {
    /// Creates a test clock starting at the current system time.
    pub fn new() -> Self {
        Self::with_start_time(SystemTime::now())
    }

    /// Creates a test clock starting at a specific system time.
    pub fn with_start_time(start: SystemTime) -> Self {
        let since_epoch = start.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            elapsed_ns: Arc::new(AtomicU64::new(0)),
            system_ns: Arc::new(AtomicU64::new(nanos_u64(since_epoch))),
            slept_ns: Arc::new(AtomicU64::new(0)),
            base_instant: Instant::now(),
        }
    }

    /// Advances both virtual clocks by `duration`.
    pub fn advance(&self, duration: Duration) {
        let ns = nanos_u64(duration);
        self.elapsed_ns.fetch_add(ns, Ordering::AcqRel);
        self.system_ns.fetch_add(ns, Ordering::AcqRel);
    }

    /// Virtual time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Acquire))
    }

    /// Total virtual time spent inside `sleep` calls.
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_ns.load(Ordering::Acquire))
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base_instant + self.elapsed()
    }

    fn now_system(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_nanos(self.system_ns.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.advance(duration);
        self.slept_ns.fetch_add(nanos_u64(duration), Ordering::AcqRel);
        // Yield so other tasks get to observe the advanced clock.
        Box::pin(tokio::task::yield_now())
    }
}

fn nanos_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_both_clocks() {
        let start = UNIX_EPOCH + Duration::from_secs(1_000);
        let clock = TestClock::with_start_time(start);

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.elapsed(), Duration::from_secs(90));
        assert_eq!(clock.now_system(), start + Duration::from_secs(90));
    }

    #[tokio::test]
    async fn sleep_advances_without_waiting() {
        let clock = TestClock::new();
        let before = Instant::now();

        clock.sleep(Duration::from_secs(3600)).await;

        assert_eq!(clock.total_slept(), Duration::from_secs(3600));
        assert!(before.elapsed() < Duration::from_secs(1));
    }
}
