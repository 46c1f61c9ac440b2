//! Error types for collector communication.
//!
//! These errors never reach the caller of the tracking API; the delivery
//! engine consumes them into outcomes. They exist so the transport can
//! categorize failures for logging and for the retry policy.

use thiserror::Error;

/// Failure modes of a single collector request.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Network-level connectivity failure.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the network failure.
        message: String,
    },

    /// Request timeout exceeded. Treated identically to any other transport
    /// failure for retry and health purposes.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Configured timeout that was exceeded.
        timeout_seconds: u64,
    },

    /// The collector answered with a non-2xx status.
    #[error("collector rejected request: HTTP {status_code}")]
    Rejected {
        /// HTTP status code returned by the collector.
        status_code: u16,
        /// Response body content.
        body: String,
    },

    /// Invalid client configuration.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl ClientError {
    /// Creates a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a rejection error from a collector response.
    pub fn rejected(status_code: u16, body: impl Into<String>) -> Self {
        Self::Rejected { status_code, body: body.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Whether this failure happened before any HTTP response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}
