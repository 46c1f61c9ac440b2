//! Tracking SDK for the beacon telemetry collector.
//!
//! This crate implements the reliability core that sits between application
//! code and the remote collector: a delivery engine that ships event and
//! error records over an unreliable network with bounded retry, exponential
//! backoff and a self-tracked collector-health flag, plus a fire-and-forget
//! dispatcher so instrumented request paths never wait on telemetry.
//!
//! # Architecture
//!
//! 1. **Tracker** — caller-facing handle; enqueues jobs on a bounded queue
//!    consumed by a fixed pool of delivery workers
//! 2. **DeliveryEngine** — turns a typed payload into an HTTP call governed
//!    by the retry policy and the health flag
//! 3. **CollectorTransport** — reqwest client with timeout and error
//!    categorization
//!
//! Delivery failures are captured outcomes, never errors: a collector outage
//! cannot crash or slow the calling application.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use beacon_client::{DeliveryEngine, TelemetryConfig, Tracker, TrackerConfig};
//! use beacon_core::RealClock;
//!
//! # fn example() -> Result<(), beacon_client::ClientError> {
//! let config = TelemetryConfig::default();
//! let engine = DeliveryEngine::new(config, Arc::new(RealClock))?;
//! let tracker = Tracker::new(Arc::new(engine), TrackerConfig::default());
//!
//! tracker.dispatch_event("page_view", Some(42), None, None, "user_action");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod health;
pub mod middleware;
pub mod payload;
pub mod retry;
pub mod transport;

pub use config::TelemetryConfig;
pub use context::{ExtractContext, RequestContext, SessionId, UserId};
pub use dispatcher::{Tracker, TrackerConfig};
pub use engine::{DeliveryEngine, ServiceErrorReport, SkipReason, TrackOutcome};
pub use error::ClientError;
pub use health::HealthTracker;
pub use retry::RetryPolicy;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Default maximum number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default exponential backoff base in seconds.
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;
