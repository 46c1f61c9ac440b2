//! Error ingestion and queries, for both frontend and service errors.

use axum::{
    extract::{Query, State},
    Json,
};
use beacon_core::{
    models::{NewServiceError, NewUiError, ServiceError, UiError},
    storage::{service_errors::ServiceErrorFilter, ui_errors::UiErrorFilter},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{error::ApiError, AppState};

/// Query parameters for `GET /errors/ui`.
#[derive(Debug, Deserialize)]
pub struct UiErrorsQuery {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one error class.
    pub error_type: Option<String>,
    /// Restrict to one page.
    pub page_path: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

/// Query parameters for `GET /service-errors`.
#[derive(Debug, Deserialize)]
pub struct ServiceErrorsQuery {
    /// Restrict to one user.
    pub user_id: Option<i64>,
    /// Restrict to one session.
    pub session_id: Option<String>,
    /// Restrict to one reporting service.
    pub service_name: Option<String>,
    /// Restrict to one error class.
    pub error_type: Option<String>,
    /// Restrict to one HTTP status code.
    pub status_code: Option<i32>,
    /// Restrict to one severity.
    pub severity: Option<String>,
    /// Restrict to one logical endpoint.
    pub endpoint: Option<String>,
    /// Inclusive lower timestamp bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    #[serde(default = "super::default_limit")]
    pub limit: i64,
}

/// `POST /errors/ui` — stores a frontend error.
pub async fn create_ui_error(
    State(state): State<AppState>,
    Json(error): Json<NewUiError>,
) -> Result<Json<UiError>, ApiError> {
    let timestamp = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.ui_errors.insert(&error, timestamp).await?;

    Ok(Json(stored))
}

/// `GET /errors/ui` — queries frontend errors.
pub async fn list_ui_errors(
    State(state): State<AppState>,
    Query(query): Query<UiErrorsQuery>,
) -> Result<Json<Vec<UiError>>, ApiError> {
    let filter = UiErrorFilter {
        user_id: query.user_id,
        session_id: query.session_id,
        error_type: query.error_type,
        page_path: query.page_path,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
    };

    let errors = state.storage.ui_errors.list(&filter).await?;
    Ok(Json(errors))
}

/// `POST /service-errors` — stores a service error, deriving severity from
/// the status code when the reporter left it unset.
pub async fn create_service_error(
    State(state): State<AppState>,
    Json(error): Json<NewServiceError>,
) -> Result<Json<ServiceError>, ApiError> {
    let severity = resolve_severity(error.severity.as_deref(), error.status_code);

    let timestamp = DateTime::<Utc>::from(state.clock.now_system());
    let stored = state.storage.service_errors.insert(&error, &severity, timestamp).await?;

    Ok(Json(stored))
}

/// `GET /service-errors` — queries service errors.
pub async fn list_service_errors(
    State(state): State<AppState>,
    Query(query): Query<ServiceErrorsQuery>,
) -> Result<Json<Vec<ServiceError>>, ApiError> {
    let filter = ServiceErrorFilter {
        user_id: query.user_id,
        session_id: query.session_id,
        service_name: query.service_name,
        error_type: query.error_type,
        status_code: query.status_code,
        severity: query.severity,
        endpoint: query.endpoint,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: query.limit,
    };

    let errors = state.storage.service_errors.list(&filter).await?;
    Ok(Json(errors))
}

/// Severity resolution: an explicit value wins; otherwise 5xx is ERROR,
/// 404 is INFO (expected noise), other 4xx are WARNING, anything else is
/// INFO; with no status code at all the error defaults to ERROR.
fn resolve_severity(explicit: Option<&str>, status_code: Option<i32>) -> String {
    if let Some(severity) = explicit {
        return severity.to_uppercase();
    }

    match status_code {
        Some(code) if (500..600).contains(&code) => "ERROR".to_string(),
        Some(404) => "INFO".to_string(),
        Some(code) if (400..500).contains(&code) => "WARNING".to_string(),
        Some(_) => "INFO".to_string(),
        None => "ERROR".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_severity_wins_and_is_uppercased() {
        assert_eq!(resolve_severity(Some("warning"), Some(500)), "WARNING");
    }

    #[test]
    fn five_hundreds_are_errors() {
        assert_eq!(resolve_severity(None, Some(500)), "ERROR");
        assert_eq!(resolve_severity(None, Some(599)), "ERROR");
    }

    #[test]
    fn not_found_is_info_other_client_errors_warn() {
        assert_eq!(resolve_severity(None, Some(404)), "INFO");
        assert_eq!(resolve_severity(None, Some(400)), "WARNING");
        assert_eq!(resolve_severity(None, Some(422)), "WARNING");
    }

    #[test]
    fn success_codes_are_info() {
        assert_eq!(resolve_severity(None, Some(200)), "INFO");
        assert_eq!(resolve_severity(None, Some(302)), "INFO");
    }

    #[test]
    fn no_status_code_defaults_to_error() {
        assert_eq!(resolve_severity(None, None), "ERROR");
    }
}
