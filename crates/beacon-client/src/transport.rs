//! HTTP transport to the collector service.
//!
//! Thin reqwest wrapper handling request construction, timeout enforcement
//! and error categorization for the delivery engine.

use serde_json::Value;
use tracing::debug;

use crate::{config::TelemetryConfig, error::ClientError};

/// HTTP client for collector requests.
///
/// Uses connection pooling and a per-request timeout. A timeout is reported
/// as its own error variant but is treated identically to any other
/// transport failure by the delivery engine.
#[derive(Debug, Clone)]
pub struct CollectorTransport {
    client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl CollectorTransport {
    /// Creates a transport for the configured collector.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be
    /// built with the configured settings.
    pub fn new(config: &TelemetryConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("beacon-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ClientError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.service_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout.as_secs(),
        })
    }

    /// POSTs a JSON payload to a collector endpoint.
    ///
    /// # Errors
    ///
    /// - `Transport` for connection failures
    /// - `Timeout` when the configured timeout elapses
    /// - `Rejected` for any non-2xx response
    pub async fn post_json(&self, endpoint: &str, payload: &Value) -> Result<Value, ClientError> {
        let url = format!("{}{endpoint}", self.base_url);
        debug!(url = %url, "sending collector request");

        let response = self.client.post(&url).json(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::timeout(self.timeout_seconds)
            } else if e.is_connect() {
                ClientError::transport(format!("connection failed: {e}"))
            } else {
                ClientError::transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ClientError::rejected(status.as_u16(), body));
        }

        // The collector echoes the stored record; a non-JSON body is kept
        // as-is rather than failing the delivery.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Probes the collector health endpoint; success is HTTP 200.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(error = %e, "collector health probe failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport_for(server: &MockServer) -> CollectorTransport {
        let config =
            TelemetryConfig { service_url: server.uri(), ..TelemetryConfig::default() };
        CollectorTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn successful_post_returns_response_body() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let response = transport.post_json("/events", &json!({"event_type": "x"})).await.unwrap();

        assert_eq!(response["id"], 7);
    }

    #[tokio::test]
    async fn non_2xx_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport.post_json("/events", &json!({})).await.unwrap_err();

        match err {
            ClientError::Rejected { status_code, body } => {
                assert_eq!(status_code, 503);
                assert_eq!(body, "unavailable");
            },
            other => panic!("expected rejection, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_transport_error() {
        // Port 1 is never listening.
        let config = TelemetryConfig {
            service_url: "http://127.0.0.1:1".to_string(),
            ..TelemetryConfig::default()
        };
        let transport = CollectorTransport::new(&config).unwrap();

        let err = transport.post_json("/events", &json!({})).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn health_probe_requires_200() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        assert!(transport.check_health().await);

        let failing = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&failing)
            .await;

        let transport = transport_for(&failing);
        assert!(!transport.check_health().await);
    }
}
