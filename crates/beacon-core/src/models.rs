//! Telemetry record models.
//!
//! One struct per collector table, plus the `New*` insert shapes accepted by
//! the HTTP layer. Records are timestamped by the service at insert time,
//! never by the reporting client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tracked user-behavior event.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserEvent {
    /// Database identifier.
    pub id: i64,
    /// User that performed the action, when known.
    pub user_id: Option<i64>,
    /// Session the event belongs to, when known.
    pub session_id: Option<String>,
    /// Event type, e.g. `page_view` or `request`.
    pub event_type: String,
    /// Coarse category, e.g. `user_action` or `api_request`.
    pub event_category: Option<String>,
    /// Server-side insert time; retention is keyed on this.
    pub timestamp: DateTime<Utc>,
    /// Free-form event metadata.
    pub event_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Reporting IP address.
    pub ip_address: Option<String>,
    /// Service that reported the event.
    pub service_name: Option<String>,
    /// Request id for cross-service correlation.
    pub request_id: Option<String>,
}

/// Insert shape for [`UserEvent`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUserEvent {
    /// User that performed the action.
    pub user_id: Option<i64>,
    /// Session the event belongs to.
    pub session_id: Option<String>,
    /// Event type.
    pub event_type: String,
    /// Coarse category.
    pub event_category: Option<String>,
    /// Free-form event metadata.
    pub event_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Reporting IP address.
    pub ip_address: Option<String>,
    /// Service that reported the event.
    pub service_name: Option<String>,
    /// Request id for correlation.
    pub request_id: Option<String>,
}

/// A UI interaction event (clicks, form changes, submits).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UiEvent {
    /// Database identifier.
    pub id: i64,
    /// User that interacted, when known.
    pub user_id: Option<i64>,
    /// Session the interaction belongs to.
    pub session_id: Option<String>,
    /// Interaction kind: click, change, focus, blur, submit.
    pub interaction_type: String,
    /// Element kind: button, input, checkbox, select, form.
    pub element_type: Option<String>,
    /// Name of the interacted element.
    pub element_name: Option<String>,
    /// HTML id of the element, if present.
    pub element_id: Option<String>,
    /// Route/page the interaction happened on.
    pub page_path: Option<String>,
    /// Component or page context.
    pub page_context: Option<String>,
    /// Named route, if the frontend router provides one.
    pub route_name: Option<String>,
    /// Sanitized element value or checked state.
    pub event_value: Option<String>,
    /// Free-form metadata.
    pub event_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Viewport width in pixels.
    pub viewport_width: Option<i32>,
    /// Viewport height in pixels.
    pub viewport_height: Option<i32>,
    /// Device class: mobile, tablet, desktop.
    pub device_type: Option<String>,
    /// Milliseconds from page load to this interaction.
    pub time_to_interaction_ms: Option<i32>,
    /// Server-side insert time.
    pub timestamp: DateTime<Utc>,
}

/// Insert shape for [`UiEvent`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUiEvent {
    /// User that interacted.
    pub user_id: Option<i64>,
    /// Session the interaction belongs to.
    pub session_id: Option<String>,
    /// Interaction kind.
    pub interaction_type: String,
    /// Element kind.
    pub element_type: Option<String>,
    /// Name of the interacted element.
    pub element_name: Option<String>,
    /// HTML id of the element.
    pub element_id: Option<String>,
    /// Route/page the interaction happened on.
    pub page_path: Option<String>,
    /// Component or page context.
    pub page_context: Option<String>,
    /// Named route.
    pub route_name: Option<String>,
    /// Sanitized element value.
    pub event_value: Option<String>,
    /// Free-form metadata.
    pub event_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Viewport width in pixels.
    pub viewport_width: Option<i32>,
    /// Viewport height in pixels.
    pub viewport_height: Option<i32>,
    /// Device class.
    pub device_type: Option<String>,
    /// Milliseconds from page load to interaction.
    pub time_to_interaction_ms: Option<i32>,
}

/// A frontend console/script error.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UiError {
    /// Database identifier.
    pub id: i64,
    /// Affected user, when known.
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    pub session_id: Option<String>,
    /// Error message text.
    pub error_message: String,
    /// Error class, e.g. `TypeError`.
    pub error_type: Option<String>,
    /// Stack trace, when captured.
    pub error_stack: Option<String>,
    /// Source file or URL the error originated from.
    pub error_source: Option<String>,
    /// Line number in the source.
    pub line_number: Option<i32>,
    /// Column number in the source.
    pub column_number: Option<i32>,
    /// Route/page the error happened on.
    pub page_path: Option<String>,
    /// Component or page context.
    pub page_context: Option<String>,
    /// Named route.
    pub route_name: Option<String>,
    /// Free-form metadata.
    pub error_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Viewport width in pixels.
    pub viewport_width: Option<i32>,
    /// Viewport height in pixels.
    pub viewport_height: Option<i32>,
    /// Device class.
    pub device_type: Option<String>,
    /// Server-side insert time.
    pub timestamp: DateTime<Utc>,
}

/// Insert shape for [`UiError`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUiError {
    /// Affected user.
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    pub session_id: Option<String>,
    /// Error message text.
    pub error_message: String,
    /// Error class.
    pub error_type: Option<String>,
    /// Stack trace.
    pub error_stack: Option<String>,
    /// Source file or URL.
    pub error_source: Option<String>,
    /// Line number in the source.
    pub line_number: Option<i32>,
    /// Column number in the source.
    pub column_number: Option<i32>,
    /// Route/page the error happened on.
    pub page_path: Option<String>,
    /// Component or page context.
    pub page_context: Option<String>,
    /// Named route.
    pub route_name: Option<String>,
    /// Free-form metadata.
    pub error_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Viewport width in pixels.
    pub viewport_width: Option<i32>,
    /// Viewport height in pixels.
    pub viewport_height: Option<i32>,
    /// Device class.
    pub device_type: Option<String>,
}

/// A backend/service error reported by an instrumented application.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceError {
    /// Database identifier.
    pub id: i64,
    /// Affected user, when known.
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    pub session_id: Option<String>,
    /// Error message text.
    pub error_message: String,
    /// Error class, e.g. the exception type name.
    pub error_type: Option<String>,
    /// HTTP status code associated with the failure.
    pub status_code: Option<i32>,
    /// Severity: INFO, WARNING or ERROR. Derived from the status code when
    /// the reporter leaves it unset.
    pub severity: String,
    /// URL of the failed request.
    pub request_url: Option<String>,
    /// Method of the failed request.
    pub request_method: Option<String>,
    /// Captured request headers.
    pub request_headers: Option<Value>,
    /// Captured request body.
    pub request_body: Option<String>,
    /// Captured response body.
    pub response_body: Option<String>,
    /// Captured response headers.
    pub response_headers: Option<Value>,
    /// Service that reported the error.
    pub service_name: Option<String>,
    /// Logical endpoint name.
    pub endpoint: Option<String>,
    /// Request id for correlation.
    pub request_id: Option<String>,
    /// Application-specific error code.
    pub error_code: Option<String>,
    /// Timeout in milliseconds, for timeout failures.
    pub timeout_ms: Option<i32>,
    /// Stack trace, when captured.
    pub stack_trace: Option<String>,
    /// Free-form metadata.
    pub error_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Reporting IP address.
    pub ip_address: Option<String>,
    /// Server-side insert time.
    pub timestamp: DateTime<Utc>,
}

/// Insert shape for [`ServiceError`]. `severity` is optional here; the
/// handler derives it from `status_code` when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewServiceError {
    /// Affected user.
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    pub session_id: Option<String>,
    /// Error message text.
    pub error_message: String,
    /// Error class.
    pub error_type: Option<String>,
    /// HTTP status code associated with the failure.
    pub status_code: Option<i32>,
    /// Severity override; derived when unset.
    pub severity: Option<String>,
    /// URL of the failed request.
    pub request_url: Option<String>,
    /// Method of the failed request.
    pub request_method: Option<String>,
    /// Captured request headers.
    pub request_headers: Option<Value>,
    /// Captured request body.
    pub request_body: Option<String>,
    /// Captured response body.
    pub response_body: Option<String>,
    /// Captured response headers.
    pub response_headers: Option<Value>,
    /// Service that reported the error.
    pub service_name: Option<String>,
    /// Logical endpoint name.
    pub endpoint: Option<String>,
    /// Request id for correlation.
    pub request_id: Option<String>,
    /// Application-specific error code.
    pub error_code: Option<String>,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<i32>,
    /// Stack trace.
    pub stack_trace: Option<String>,
    /// Free-form metadata.
    pub error_metadata: Option<Value>,
    /// Reporting user agent.
    pub user_agent: Option<String>,
    /// Reporting IP address.
    pub ip_address: Option<String>,
}

/// A manually recorded debugging/QA session.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecordedSession {
    /// Database identifier.
    pub id: i64,
    /// Operator-chosen name.
    pub name: Option<String>,
    /// Recording start; retention is keyed on this.
    pub started_at: DateTime<Utc>,
    /// Recording end, unset while active.
    pub ended_at: Option<DateTime<Utc>>,
    /// Recording duration, computed at end.
    pub duration_seconds: Option<i32>,
    /// Operator notes.
    pub notes: Option<String>,
    /// Free-form metadata.
    pub session_metadata: Option<Value>,
}

/// Insert/update shape for [`RecordedSession`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRecordedSession {
    /// Operator-chosen name.
    pub name: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
    /// Free-form metadata.
    pub session_metadata: Option<Value>,
}

/// An aggregated browsing session. Counted by `/stats` but never pruned by
/// the retention sweep.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSession {
    /// Session identifier (client-generated).
    pub id: String,
    /// User the session belongs to.
    pub user_id: Option<i64>,
    /// Session start.
    pub started_at: DateTime<Utc>,
    /// Session end, unset while active.
    pub ended_at: Option<DateTime<Utc>>,
    /// Session duration.
    pub duration_seconds: Option<i32>,
    /// Pages viewed during the session.
    pub page_views: i32,
    /// Events recorded during the session.
    pub events_count: i32,
    /// Device class.
    pub device_type: Option<String>,
    /// Browser name.
    pub browser: Option<String>,
    /// Operating system.
    pub os: Option<String>,
}
