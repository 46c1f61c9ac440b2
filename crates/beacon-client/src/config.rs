//! Configuration for the tracking client.

use std::time::Duration;

use crate::error::ClientError;

/// Configuration for the tracking client.
///
/// Built once at startup and passed explicitly to the delivery engine; there
/// is no process-global configuration. Defaults work against a local
/// collector; `from_env` applies `BEACON_*` environment overrides for
/// deployment.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Base URL of the collector service.
    pub service_url: String,
    /// Name this application reports itself as.
    pub service_name: String,
    /// Request timeout for collector calls.
    pub timeout: Duration,
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Exponential backoff base: attempt `k` sleeps `base^k` seconds.
    pub retry_backoff_base: f64,
    /// Verbose logging of skipped and failed deliveries.
    pub dev_mode: bool,
    /// Skip the network entirely and echo constructed payloads. Makes
    /// tracking deterministic in the caller's tests.
    pub test_mode: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8006".to_string(),
            service_name: "rust-service".to_string(),
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECONDS),
            max_retries: crate::DEFAULT_MAX_RETRIES,
            retry_backoff_base: crate::DEFAULT_BACKOFF_BASE,
            dev_mode: false,
            test_mode: false,
        }
    }
}

impl TelemetryConfig {
    /// Loads configuration from `BEACON_*` environment variables on top of
    /// the defaults.
    ///
    /// Recognized variables: `BEACON_SERVICE_URL`, `BEACON_SERVICE_NAME`,
    /// `BEACON_TIMEOUT_SECONDS`, `BEACON_MAX_RETRIES`,
    /// `BEACON_RETRY_BACKOFF_BASE`, `BEACON_DEV_MODE`, `BEACON_TEST_MODE`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if a variable is present but
    /// unparseable, or the resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BEACON_SERVICE_URL") {
            config.service_url = url;
        }
        if let Ok(name) = std::env::var("BEACON_SERVICE_NAME") {
            config.service_name = name;
        }
        if let Ok(raw) = std::env::var("BEACON_TIMEOUT_SECONDS") {
            let seconds: u64 = raw.parse().map_err(|_| {
                ClientError::configuration(format!("invalid BEACON_TIMEOUT_SECONDS: {raw}"))
            })?;
            config.timeout = Duration::from_secs(seconds);
        }
        if let Ok(raw) = std::env::var("BEACON_MAX_RETRIES") {
            config.max_retries = raw.parse().map_err(|_| {
                ClientError::configuration(format!("invalid BEACON_MAX_RETRIES: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("BEACON_RETRY_BACKOFF_BASE") {
            config.retry_backoff_base = raw.parse().map_err(|_| {
                ClientError::configuration(format!("invalid BEACON_RETRY_BACKOFF_BASE: {raw}"))
            })?;
        }
        if let Ok(raw) = std::env::var("BEACON_DEV_MODE") {
            config.dev_mode = raw.eq_ignore_ascii_case("true");
        }
        if let Ok(raw) = std::env::var("BEACON_TEST_MODE") {
            config.test_mode = raw.eq_ignore_ascii_case("true");
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` for a zero timeout or a backoff
    /// base below 1.0.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.timeout.is_zero() {
            return Err(ClientError::configuration("timeout must be greater than zero"));
        }
        if self.retry_backoff_base < 1.0 {
            return Err(ClientError::configuration("retry_backoff_base must be at least 1.0"));
        }
        if self.service_url.is_empty() {
            return Err(ClientError::configuration("service_url must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TelemetryConfig::default();

        assert_eq!(config.service_url, "http://localhost:8006");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert!((config.retry_backoff_base - 2.0).abs() < f64::EPSILON);
        assert!(!config.dev_mode);
        assert!(!config.test_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = TelemetryConfig { timeout: Duration::ZERO, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn sub_one_backoff_base_rejected() {
        let config = TelemetryConfig { retry_backoff_base: 0.5, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
