//! Error types for talking to the download manager.
//!
//! Callers of [`Probe`](super::Probe) and [`Forwarder`](super::Forwarder)
//! only ever see a boolean; these errors exist for logging and for the
//! CLI, which reports why a handoff did not happen.

use thiserror::Error;

/// Errors that can occur while probing or forwarding to the manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Nothing is listening on the manager port (connection refused, DNS, etc.)
    #[error("download manager unreachable at {endpoint}: {source}")]
    Unreachable {
        /// The endpoint that could not be reached.
        endpoint: String,
        /// The underlying connection error.
        #[source]
        source: reqwest::Error,
    },

    /// The manager accepted the connection but did not answer in time.
    #[error("download manager timed out at {endpoint}")]
    Timeout {
        /// The endpoint that timed out.
        endpoint: String,
    },

    /// The manager answered with a non-success status.
    #[error("download manager rejected request to {endpoint} with HTTP {status}")]
    Rejected {
        /// The endpoint that rejected the request.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Any other failure while the request was in flight.
    #[error("transport error talking to {endpoint}: {source}")]
    Transport {
        /// The endpoint in use when the error occurred.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// An endpoint URL could not be built from the configuration.
    #[error("invalid manager endpoint '{path}': {source}")]
    InvalidEndpoint {
        /// The path that failed to join onto the base URL.
        path: String,
        /// The URL parse error.
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build manager HTTP client: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ManagerError {
    /// Classifies a reqwest error raised while talking to `endpoint`.
    pub fn from_request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else if source.is_connect() {
            Self::Unreachable { endpoint, source }
        } else {
            Self::Transport { endpoint, source }
        }
    }

    /// Creates a rejected-status error.
    pub fn rejected(endpoint: impl Into<String>, status: u16) -> Self {
        Self::Rejected {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(path: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidEndpoint {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the manager answered at all (even with an error status).
    #[must_use]
    pub fn manager_answered(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_error_rejected_display() {
        let error = ManagerError::rejected("http://127.0.0.1:8080/add_download", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(msg.contains("/add_download"), "Expected endpoint in: {msg}");
        assert!(error.manager_answered());
    }

    #[test]
    fn test_manager_error_timeout_display() {
        let error = ManagerError::Timeout {
            endpoint: "http://127.0.0.1:8080/ping".to_string(),
        };
        assert!(error.to_string().contains("timed out"));
        assert!(!error.manager_answered());
    }

    #[test]
    fn test_manager_error_invalid_endpoint_display() {
        let error = ManagerError::invalid_endpoint("::bad", url::ParseError::EmptyHost);
        assert!(error.to_string().contains("::bad"));
    }
}
