//! Core domain types for the beacon telemetry service.
//!
//! Provides the telemetry record models, the error taxonomy, the clock
//! abstraction used for deterministic time in tests, and the PostgreSQL
//! storage layer shared by the collector service and its background jobs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{
    NewRecordedSession, NewServiceError, NewUiError, NewUiEvent, NewUserEvent, RecordedSession,
    ServiceError, UiError, UiEvent, UserEvent, UserSession,
};
pub use storage::retention::CategoryCounts;
pub use time::{Clock, RealClock, TestClock};
