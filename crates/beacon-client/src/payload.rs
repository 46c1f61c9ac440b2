//! Wire payloads sent to the collector.
//!
//! Field presence mirrors the collector contract exactly: `user_id` and
//! `session_id` are omitted when absent, while the remaining optional fields
//! of an error payload serialize as explicit nulls.

use serde::Serialize;
use serde_json::{Map, Value};

/// Payload for `POST /events`.
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    /// Event type, e.g. `page_view`.
    pub event_type: String,
    /// Reporting service name.
    pub service_name: String,
    /// Event metadata; an empty map when the caller supplied none.
    pub event_metadata: Value,
    /// Event category.
    pub category: String,
    /// User that performed the action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Session the event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EventPayload {
    /// Builds an event payload for the given service.
    pub fn new(
        event_type: &str,
        service_name: &str,
        user_id: Option<i64>,
        session_id: Option<String>,
        metadata: Option<Value>,
        category: &str,
    ) -> Self {
        Self {
            event_type: event_type.to_string(),
            service_name: service_name.to_string(),
            event_metadata: metadata.unwrap_or_else(|| Value::Object(Map::new())),
            category: category.to_string(),
            user_id,
            session_id,
        }
    }
}

/// Payload for `POST /service-errors`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceErrorPayload {
    /// Error class, e.g. the error type name.
    pub error_type: String,
    /// Error message text.
    pub error_message: String,
    /// Reporting service name.
    pub service_name: String,
    /// Stack trace, when captured.
    pub stack_trace: Option<String>,
    /// Request path the error occurred on.
    pub request_path: Option<String>,
    /// Request method the error occurred on.
    pub request_method: Option<String>,
    /// Error metadata; an empty map when the caller supplied none.
    pub error_metadata: Value,
    /// Affected user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn event_payload_omits_absent_identity_fields() {
        let payload = EventPayload::new("page_view", "checkout", None, None, None, "user_action");
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["event_type"], "page_view");
        assert_eq!(value["service_name"], "checkout");
        assert_eq!(value["event_metadata"], json!({}));
        assert_eq!(value["category"], "user_action");
        assert!(value.get("user_id").is_none());
        assert!(value.get("session_id").is_none());
    }

    #[test]
    fn event_payload_includes_present_identity_fields() {
        let payload = EventPayload::new(
            "login",
            "auth",
            Some(42),
            Some("sess-1".to_string()),
            Some(json!({"method": "sso"})),
            "user_action",
        );
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["user_id"], 42);
        assert_eq!(value["session_id"], "sess-1");
        assert_eq!(value["event_metadata"]["method"], "sso");
    }

    #[test]
    fn error_payload_keeps_explicit_nulls_for_request_fields() {
        let payload = ServiceErrorPayload {
            error_type: "DbError".to_string(),
            error_message: "connection lost".to_string(),
            service_name: "orders".to_string(),
            stack_trace: None,
            request_path: None,
            request_method: None,
            error_metadata: json!({}),
            user_id: None,
            session_id: None,
        };
        let value = serde_json::to_value(&payload).unwrap();

        assert!(value["stack_trace"].is_null());
        assert!(value["request_path"].is_null());
        assert!(value["request_method"].is_null());
        assert!(value.get("user_id").is_none());
        assert!(value.get("session_id").is_none());
    }
}
