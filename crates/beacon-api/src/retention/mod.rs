//! Retention cleanup: configuration, store abstraction and the background
//! scheduler.
//!
//! A sweep computes `cutoff = now - retention_days` and prunes everything
//! strictly older across five record categories as one atomic unit. The
//! scheduler runs sweeps on a fixed interval, survives sweep failures with a
//! single shortened retry, and stops promptly on cancellation.

use chrono::{DateTime, Duration, Utc};

pub mod scheduler;
pub mod store;

/// Retention settings, set once at startup and immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct RetentionConfig {
    /// Days records are kept before being pruned.
    pub retention_days: u32,
    /// Hours between sweeps.
    pub interval_hours: u64,
    /// Whether the background scheduler runs.
    pub enabled: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { retention_days: 90, interval_hours: 24, enabled: true }
    }
}

/// Cutoff timestamp for a sweep at `now`: records strictly older than this
/// are pruned.
pub fn cutoff_at(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(retention_days))
}
