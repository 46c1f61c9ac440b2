//! Axum middleware for automatic request tracking.
//!
//! Extracts the request context, forwards the request, then fire-and-forget
//! dispatches a `request` event with the response status and duration. The
//! handler's response — success or failure — is returned untouched; a
//! telemetry outage is invisible to the application's users.

use std::time::Instant;

use axum::{extract::State, middleware::Next, response::Response};
use serde_json::json;

use crate::{context::ExtractContext, dispatcher::Tracker};

/// Tracks every request flowing through the router.
///
/// Install with axum's state middleware:
///
/// ```no_run
/// use axum::{middleware, Router};
/// use beacon_client::{middleware::track_requests, Tracker};
///
/// fn router(tracker: Tracker) -> Router {
///     Router::new().layer(middleware::from_fn_with_state(tracker, track_requests))
/// }
/// ```
pub async fn track_requests(
    State(tracker): State<Tracker>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let context = request.extract_context();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let metadata = json!({
        "request_path": context.request_path,
        "request_method": context.request_method,
        "status_code": response.status().as_u16(),
        "duration_ms": (duration_ms * 100.0).round() / 100.0,
    });

    tracker.dispatch_event(
        "request",
        context.user_id,
        context.session_id,
        Some(metadata),
        "api_request",
    );

    response
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{middleware, routing::get, Router};
    use beacon_core::TestClock;
    use tower::ServiceExt;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{
        config::TelemetryConfig,
        dispatcher::TrackerConfig,
        engine::DeliveryEngine,
    };

    fn tracker_for(url: &str) -> Tracker {
        let config = TelemetryConfig {
            service_url: url.to_string(),
            max_retries: 0,
            ..TelemetryConfig::default()
        };
        let engine =
            Arc::new(DeliveryEngine::new(config, Arc::new(TestClock::new())).unwrap());
        Tracker::new(engine, TrackerConfig::default())
    }

    #[tokio::test]
    async fn requests_are_tracked_with_status_and_path() {
        let collector = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/events"))
            .and(matchers::body_partial_json(serde_json::json!({
                "event_type": "request",
                "category": "api_request",
                "event_metadata": {
                    "request_path": "/orders",
                    "request_method": "GET",
                    "status_code": 200,
                },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&collector)
            .await;

        let tracker = tracker_for(&collector.uri());
        let app = Router::new()
            .route("/orders", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(tracker.clone(), track_requests));

        let response = app
            .oneshot(http::Request::builder().uri("/orders").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), http::StatusCode::OK);

        tracker.shutdown(Duration::from_secs(5)).await;
        collector.verify().await;
    }

    #[tokio::test]
    async fn handler_failure_status_is_reported_not_altered() {
        let collector = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(serde_json::json!({
                "event_metadata": { "status_code": 500 },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&collector)
            .await;

        let tracker = tracker_for(&collector.uri());
        let app = Router::new()
            .route("/boom", get(|| async { http::StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(middleware::from_fn_with_state(tracker.clone(), track_requests));

        let response = app
            .oneshot(http::Request::builder().uri("/boom").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();

        // The caller still sees its own failure.
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        tracker.shutdown(Duration::from_secs(5)).await;
        collector.verify().await;
    }
}
