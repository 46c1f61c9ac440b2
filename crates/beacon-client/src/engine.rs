//! Delivery engine orchestrating health, retry and transport.
//!
//! Turns a typed event or error payload into a collector HTTP call. Every
//! failure mode is a captured [`TrackOutcome`], never an error: telemetry
//! failures must not crash or alter the calling code path.

use std::sync::Arc;

use beacon_core::Clock;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    config::TelemetryConfig,
    error::ClientError,
    health::HealthTracker,
    payload::{EventPayload, ServiceErrorPayload},
    retry::{should_attempt, RetryPolicy},
    transport::CollectorTransport,
};

/// Terminal result of one tracking call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The collector accepted the record (HTTP 2xx) — or, in test mode, the
    /// constructed payload echoed back without a network call.
    Delivered(Value),
    /// No network call was made.
    Skipped(SkipReason),
    /// Every attempt failed; `attempts` is the total number made.
    Failed {
        /// Attempts made before giving up (`max_retries + 1` for a
        /// persistently failing transport).
        attempts: u32,
    },
}

impl TrackOutcome {
    /// Whether the record reached the collector.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// Why a delivery was skipped without touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The health flag was down on a first attempt.
    Unhealthy,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// A service error to report, with optional request context.
#[derive(Debug, Clone, Default)]
pub struct ServiceErrorReport {
    /// Error class, e.g. the error type name.
    pub error_type: String,
    /// Error message text.
    pub error_message: String,
    /// Stack trace, when captured.
    pub stack_trace: Option<String>,
    /// Request path the error occurred on.
    pub request_path: Option<String>,
    /// Request method the error occurred on.
    pub request_method: Option<String>,
    /// Affected user.
    pub user_id: Option<i64>,
    /// Session the error occurred in.
    pub session_id: Option<String>,
    /// Additional error metadata.
    pub metadata: Option<Value>,
}

/// Delivery engine for collector calls.
///
/// Holds the shared health flag and the retry policy; many concurrent
/// deliveries may run against one engine, each with its own retry chain.
pub struct DeliveryEngine {
    config: TelemetryConfig,
    transport: CollectorTransport,
    health: Arc<HealthTracker>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl DeliveryEngine {
    /// Creates an engine from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the configuration is invalid
    /// or the transport cannot be built.
    pub fn new(config: TelemetryConfig, clock: Arc<dyn Clock>) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = CollectorTransport::new(&config)?;
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base: config.retry_backoff_base,
        };

        Ok(Self {
            config,
            transport,
            health: Arc::new(HealthTracker::new()),
            retry,
            clock,
        })
    }

    /// The shared collector-health flag.
    pub fn health(&self) -> Arc<HealthTracker> {
        self.health.clone()
    }

    /// Probes the collector and updates the health flag. In test mode the
    /// collector is always considered reachable.
    pub async fn check_health(&self) -> bool {
        if self.config.test_mode {
            return true;
        }

        let healthy = self.transport.check_health().await;
        if healthy {
            self.health.mark_healthy();
        } else {
            self.health.mark_unhealthy();
        }
        healthy
    }

    /// Tracks a user event.
    pub async fn track_event(
        &self,
        event_type: &str,
        user_id: Option<i64>,
        session_id: Option<String>,
        metadata: Option<Value>,
        category: &str,
    ) -> TrackOutcome {
        let payload = EventPayload::new(
            event_type,
            &self.config.service_name,
            user_id,
            session_id,
            metadata,
            category,
        );

        self.deliver("/events", serde_json::to_value(payload).unwrap_or(Value::Null)).await
    }

    /// Tracks a service error.
    pub async fn track_service_error(&self, report: ServiceErrorReport) -> TrackOutcome {
        let payload = ServiceErrorPayload {
            error_type: report.error_type,
            error_message: report.error_message,
            service_name: self.config.service_name.clone(),
            stack_trace: report.stack_trace,
            request_path: report.request_path,
            request_method: report.request_method,
            error_metadata: report.metadata.unwrap_or_else(|| json!({})),
            user_id: report.user_id,
            session_id: report.session_id,
        };

        self.deliver("/service-errors", serde_json::to_value(payload).unwrap_or(Value::Null))
            .await
    }

    /// Runs one delivery to its terminal outcome.
    ///
    /// Policy, in order: test mode echoes the payload without any network
    /// call; a first attempt while the health flag is down short-circuits to
    /// `Skipped`; otherwise attempts run in an explicit loop, marking the
    /// flag healthy on 2xx and unhealthy on any failure, sleeping
    /// `backoff_base ^ attempt` seconds between attempts until
    /// `max_retries` retries are spent.
    async fn deliver(&self, endpoint: &str, payload: Value) -> TrackOutcome {
        if self.config.test_mode {
            debug!(endpoint, "test mode: echoing payload without network call");
            return TrackOutcome::Delivered(json!({
                "status": "test_mode",
                "data": payload,
            }));
        }

        let mut attempt: u32 = 0;

        loop {
            // Only first attempts are gated on health; an in-flight retry
            // chain proceeds regardless so it can restore the flag.
            if !should_attempt(attempt, self.health.is_healthy()) {
                if self.config.dev_mode {
                    debug!(endpoint, "collector unhealthy, skipping delivery");
                }
                return TrackOutcome::Skipped(SkipReason::Unhealthy);
            }

            match self.transport.post_json(endpoint, &payload).await {
                Ok(response) => {
                    self.health.mark_healthy();
                    return TrackOutcome::Delivered(response);
                },
                Err(error) => {
                    self.health.mark_unhealthy();
                    self.handle_failure(endpoint, attempt, &error);

                    if !self.retry.should_retry(attempt) {
                        return TrackOutcome::Failed { attempts: attempt + 1 };
                    }

                    self.clock.sleep(self.retry.backoff_delay(attempt)).await;
                    attempt += 1;
                },
            }
        }
    }

    fn handle_failure(&self, endpoint: &str, attempt: u32, error: &ClientError) {
        if self.retry.should_retry(attempt) {
            if self.config.dev_mode {
                debug!(
                    endpoint,
                    attempt,
                    delay_seconds = self.retry.backoff_delay(attempt).as_secs_f64(),
                    error = %error,
                    "delivery failed, backing off before retry"
                );
            }
        } else {
            warn!(
                endpoint,
                attempts = attempt + 1,
                error = %error,
                "delivery failed, retries exhausted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use beacon_core::TestClock;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn engine_for(url: &str, max_retries: u32, clock: Arc<TestClock>) -> DeliveryEngine {
        let config = TelemetryConfig {
            service_url: url.to_string(),
            service_name: "test-service".to_string(),
            max_retries,
            ..TelemetryConfig::default()
        };
        DeliveryEngine::new(config, clock).unwrap()
    }

    #[tokio::test]
    async fn persistent_failure_makes_exactly_max_retries_plus_one_attempts() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/events"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let engine = engine_for(&server.uri(), 3, Arc::new(TestClock::new()));
        let outcome = engine.track_event("x", None, None, None, "user_action").await;

        assert_eq!(outcome, TrackOutcome::Failed { attempts: 4 });
        server.verify().await;
    }

    #[tokio::test]
    async fn backoff_sleeps_one_two_four_seconds_for_base_two() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let clock = Arc::new(TestClock::new());
        let engine = engine_for(&server.uri(), 3, clock.clone());
        let outcome = engine.track_event("x", None, None, None, "user_action").await;

        assert!(matches!(outcome, TrackOutcome::Failed { .. }));
        // 2^0 + 2^1 + 2^2 seconds slept across the three backoffs.
        assert_eq!(clock.total_slept(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn unhealthy_first_attempt_skips_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let engine = engine_for(&server.uri(), 3, Arc::new(TestClock::new()));
        engine.health().mark_unhealthy();

        let outcome = engine.track_event("x", None, None, None, "user_action").await;

        assert_eq!(outcome, TrackOutcome::Skipped(SkipReason::Unhealthy));
        server.verify().await;
    }

    #[tokio::test]
    async fn retry_chain_bypasses_health_gate_and_self_heals() {
        let server = MockServer::start().await;
        // First attempt fails and marks the flag down; the retry must still
        // go out and restore it.
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .with_priority(2)
            .mount(&server)
            .await;

        let engine = engine_for(&server.uri(), 3, Arc::new(TestClock::new()));
        let outcome = engine.track_event("x", None, None, None, "user_action").await;

        assert!(outcome.is_delivered());
        assert!(engine.health().is_healthy());
    }

    #[tokio::test]
    async fn success_marks_health_and_failure_clears_it() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let engine = engine_for(&server.uri(), 0, Arc::new(TestClock::new()));
        engine.health().mark_unhealthy();

        // Skipped: flag down on a first attempt.
        let skipped = engine.track_event("x", None, None, None, "user_action").await;
        assert_eq!(skipped, TrackOutcome::Skipped(SkipReason::Unhealthy));

        // After a manual probe restores the flag, delivery succeeds.
        engine.health().mark_healthy();
        let delivered = engine.track_event("x", None, None, None, "user_action").await;
        assert!(delivered.is_delivered());
        assert!(engine.health().is_healthy());
    }

    #[tokio::test]
    async fn test_mode_echoes_wire_payload_without_network() {
        let config = TelemetryConfig {
            // Unroutable: any network call would fail loudly.
            service_url: "http://127.0.0.1:1".to_string(),
            service_name: "checkout".to_string(),
            test_mode: true,
            ..TelemetryConfig::default()
        };
        let engine = DeliveryEngine::new(config, Arc::new(TestClock::new())).unwrap();

        let outcome = engine
            .track_event(
                "login",
                Some(42),
                Some("sess-9".to_string()),
                Some(serde_json::json!({"method": "sso"})),
                "user_action",
            )
            .await;

        let TrackOutcome::Delivered(response) = outcome else {
            panic!("test mode must deliver");
        };
        assert_eq!(response["status"], "test_mode");

        let data = &response["data"];
        assert_eq!(data["event_type"], "login");
        assert_eq!(data["service_name"], "checkout");
        assert_eq!(data["category"], "user_action");
        assert_eq!(data["user_id"], 42);
        assert_eq!(data["session_id"], "sess-9");
        assert_eq!(data["event_metadata"]["method"], "sso");
    }

    #[tokio::test]
    async fn service_error_payload_reaches_collector_endpoint() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/service-errors"))
            .and(matchers::body_partial_json(serde_json::json!({
                "error_type": "DbError",
                "error_message": "connection lost",
                "service_name": "test-service",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server.uri(), 0, Arc::new(TestClock::new()));
        let outcome = engine
            .track_service_error(ServiceErrorReport {
                error_type: "DbError".to_string(),
                error_message: "connection lost".to_string(),
                ..Default::default()
            })
            .await;

        assert!(outcome.is_delivered());
        server.verify().await;
    }
}
