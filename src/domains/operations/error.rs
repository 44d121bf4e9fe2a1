//! Gateway error taxonomy shared by both front ends.

use serde_json::Value;
use thiserror::Error;

use crate::domains::upstream::UpstreamError;

/// Failure of an operation invocation, independent of the front end.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Arguments did not satisfy the operation's declaration.
    #[error("Invalid arguments for '{operation}': {reason}")]
    Validation { operation: String, reason: String },

    /// No credential could be resolved for the call.
    #[error("API token is required")]
    MissingCredential,

    /// Upstream refused the credential (401/403).
    #[error("Invalid token or insufficient permissions")]
    Auth { status: u16, body: Value },

    #[error("Resource not found")]
    NotFound { body: Value },

    /// Upstream rejected the request as invalid (other 4xx).
    #[error("Upstream rejected the request ({status}): {}", upstream_message(.body))]
    Rejected { status: u16, body: Value },

    /// Rate limit still exceeded after the retry budget ran out.
    #[error("Upstream rate limit exceeded")]
    RateLimited { body: Value },

    /// Server-side or network failure after the retry budget ran out.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        body: Option<Value>,
        message: String,
    },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Local failure. The detail is for logs only and never shown to callers.
    #[error("Internal error")]
    Internal(String),
}

impl GatewayError {
    pub fn validation(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status for this error on the REST front end.
    ///
    /// Upstream failures mirror the upstream status; failures that never got
    /// an upstream answer map to 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::MissingCredential => 401,
            Self::Auth { status, .. } | Self::Rejected { status, .. } => *status,
            Self::NotFound { .. } | Self::UnknownOperation(_) => 404,
            Self::RateLimited { .. } => 429,
            Self::Upstream { status, .. } => status.unwrap_or(500),
            Self::Internal(_) => 500,
        }
    }

    /// Upstream body attached to this error, when there is one worth showing.
    /// Never set for auth failures.
    pub fn details(&self) -> Option<&Value> {
        let body = match self {
            Self::NotFound { body }
            | Self::Rejected { body, .. }
            | Self::RateLimited { body } => Some(body),
            Self::Upstream { body, .. } => body.as_ref(),
            _ => None,
        };
        body.filter(|b| !b.is_null())
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(error: UpstreamError) -> Self {
        match error {
            UpstreamError::Network { message, timeout } => Self::Upstream {
                status: None,
                body: None,
                message: if timeout {
                    "Timeout: upstream did not respond in time".to_string()
                } else {
                    format!("Upstream unreachable: {message}")
                },
            },
            UpstreamError::Status { status, body } => match status {
                401 | 403 => Self::Auth { status, body },
                404 => Self::NotFound { body },
                429 => Self::RateLimited { body },
                s if s >= 500 => Self::Upstream {
                    status: Some(s),
                    body: Some(body),
                    message: format!("Upstream error ({s})"),
                },
                s => Self::Rejected { status: s, body },
            },
            UpstreamError::InvalidRequest(detail) => Self::Internal(detail),
            UpstreamError::MalformedResponse(detail) => {
                Self::Internal(format!("malformed upstream response: {detail}"))
            }
        }
    }
}

/// Human-readable message carried by an upstream error body.
pub fn upstream_message(body: &Value) -> String {
    match body {
        Value::Null => "no details".to_string(),
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => body.to_string(),
        },
        other => other.to_string(),
    }
}
