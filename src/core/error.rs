//! Error types for server construction.
//!
//! Invocation failures are [`GatewayError`](crate::domains::operations::GatewayError)s
//! and front-end failures are [`TransportError`](super::transport::TransportError)s;
//! this type covers what can go wrong before either exists.

use thiserror::Error;

/// A specialized Result type for server construction.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Building the upstream client failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::upstream::UpstreamError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
