//! Request handlers for the collector API.

pub mod analytics;
pub mod cleanup;
pub mod errors;
pub mod events;
pub mod health;
pub mod sessions;
pub mod ui_events;

pub use analytics::{analytics_summary, stats};
pub use cleanup::run_cleanup;
pub use errors::{create_service_error, create_ui_error, list_service_errors, list_ui_errors};
pub use events::{create_event, list_events};
pub use health::health_check;
pub use sessions::{
    end_recorded_session, get_recorded_session, list_recorded_sessions, start_recorded_session,
};
pub use ui_events::{create_ui_event, list_ui_events};

fn default_limit() -> i64 {
    100
}
