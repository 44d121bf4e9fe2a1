//! Upstream call error types.

use serde_json::Value;
use thiserror::Error;

/// Errors produced while performing a call against the upstream CRM API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// No response was received (connect failure, DNS failure, timeout).
    #[error("Upstream unreachable: {message}")]
    Network {
        message: String,
        /// Whether the failure was a per-attempt timeout.
        timeout: bool,
    },

    /// The upstream answered with a non-success status.
    #[error("Upstream responded with status {status}")]
    Status { status: u16, body: Value },

    /// The call description could not be turned into a request.
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),

    /// A success response carried a body that is not JSON.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl UpstreamError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timeout: false,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            timeout: true,
        }
    }

    /// Create a status error.
    pub fn status(status: u16, body: Value) -> Self {
        Self::Status { status, body }
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// HTTP status carried by this error, if the upstream answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
