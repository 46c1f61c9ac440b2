//! HTTP error mapping for the collector API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use beacon_core::CoreError;
use serde_json::json;
use tracing::error;

/// Error type returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The requested record does not exist.
    NotFound(String),
    /// The request is semantically invalid.
    BadRequest(String),
    /// The store or another internal component failed.
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(message) => Self::NotFound(message),
            CoreError::InvalidInput(message) => Self::BadRequest(message),
            CoreError::Database(message) | CoreError::ConstraintViolation(message) => {
                Self::Internal(message)
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => {
                error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::from(CoreError::NotFound("session 9".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_input_maps_to_400() {
        let response =
            ApiError::from(CoreError::InvalidInput("already ended".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_failures_do_not_leak_details() {
        let response =
            ApiError::from(CoreError::Database("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
