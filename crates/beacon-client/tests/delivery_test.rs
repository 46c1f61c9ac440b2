//! End-to-end delivery behavior against a mock collector.

use std::{sync::Arc, time::Duration};

use beacon_client::{
    DeliveryEngine, ServiceErrorReport, TelemetryConfig, TrackOutcome, Tracker, TrackerConfig,
};
use beacon_core::TestClock;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

fn engine(url: &str, max_retries: u32) -> Arc<DeliveryEngine> {
    let config = TelemetryConfig {
        service_url: url.to_string(),
        service_name: "orders".to_string(),
        max_retries,
        ..TelemetryConfig::default()
    };
    Arc::new(DeliveryEngine::new(config, Arc::new(TestClock::new())).unwrap())
}

#[tokio::test]
async fn attempts_scale_with_configured_max_retries() {
    for max_retries in [0u32, 1, 2] {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/events"))
            .respond_with(ResponseTemplate::new(500))
            .expect(u64::from(max_retries) + 1)
            .mount(&server)
            .await;

        let outcome = engine(&server.uri(), max_retries)
            .track_event("x", None, None, None, "user_action")
            .await;

        assert_eq!(outcome, TrackOutcome::Failed { attempts: max_retries + 1 });
        server.verify().await;
    }
}

#[tokio::test]
async fn events_and_errors_route_to_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/service-errors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server.uri(), 0);
    assert!(engine.track_event("signup", Some(1), None, None, "user_action").await.is_delivered());
    assert!(engine
        .track_service_error(ServiceErrorReport {
            error_type: "Timeout".to_string(),
            error_message: "upstream timed out".to_string(),
            request_path: Some("/api/pay".to_string()),
            request_method: Some("POST".to_string()),
            ..Default::default()
        })
        .await
        .is_delivered());

    server.verify().await;
}

#[tokio::test]
async fn outage_short_circuits_later_first_attempts() {
    let server = MockServer::start().await;
    // Exactly one request: the failing first call. The second call must be
    // skipped by the health gate without touching the network.
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server.uri(), 0);

    let first = engine.track_event("a", None, None, None, "user_action").await;
    assert_eq!(first, TrackOutcome::Failed { attempts: 1 });

    let second = engine.track_event("b", None, None, None, "user_action").await;
    assert!(matches!(second, TrackOutcome::Skipped(_)));

    server.verify().await;
}

#[tokio::test]
async fn health_probe_reopens_the_gate() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/events"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .with_priority(2)
        .mount(&server)
        .await;

    let engine = engine(&server.uri(), 0);

    assert!(matches!(
        engine.track_event("a", None, None, None, "user_action").await,
        TrackOutcome::Failed { .. }
    ));
    assert!(matches!(
        engine.track_event("b", None, None, None, "user_action").await,
        TrackOutcome::Skipped(_)
    ));

    assert!(engine.check_health().await);

    let delivered = engine.track_event("c", None, None, None, "user_action").await;
    assert!(delivered.is_delivered());
}

#[tokio::test]
async fn dispatch_never_blocks_on_a_slow_collector() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let tracker = Tracker::new(engine(&server.uri(), 0), TrackerConfig::default());

    let start = std::time::Instant::now();
    tracker.dispatch_event("click", None, None, None, "user_action");
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(100),
        "dispatch must return immediately, took {elapsed:?}"
    );

    tracker.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_mode_is_deterministic_for_caller_tests() {
    let config = TelemetryConfig {
        service_url: "http://127.0.0.1:1".to_string(),
        service_name: "orders".to_string(),
        test_mode: true,
        ..TelemetryConfig::default()
    };
    let engine = Arc::new(DeliveryEngine::new(config, Arc::new(TestClock::new())).unwrap());

    for _ in 0..3 {
        let outcome = engine
            .track_event("checkout", Some(5), None, Some(serde_json::json!({"cart": 3})), "user_action")
            .await;

        let TrackOutcome::Delivered(response) = outcome else {
            panic!("test mode always delivers");
        };
        assert_eq!(response["status"], "test_mode");
        assert_eq!(response["data"]["event_type"], "checkout");
        assert_eq!(response["data"]["user_id"], 5);
    }
}
