//! Configuration management for the gateway.
//!
//! Configuration is loaded once at startup from environment variables (a
//! `.env` file is honored) and shared read-only afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::transport::TransportConfig;
use crate::domains::upstream::{Credential, RetryPolicy};

/// Default upstream API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.pipe.run/v1";

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Front end to serve.
    pub transport: TransportConfig,

    /// Upstream API location and credentials.
    pub upstream: UpstreamConfig,

    /// Retry policy for upstream calls.
    pub retry: RetryConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL` (after loading `.env`). Called on its own at
    /// startup, before [`Config::from_env`] logs anything.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        match std::env::var("MCP_LOG_LEVEL") {
            Ok(level) if !level.trim().is_empty() => Self { level },
            _ => Self::default(),
        }
    }
}

/// Upstream API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,

    /// Process-wide default API token.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The default credential, if a non-blank token is configured.
    pub fn default_credential(&self) -> Option<Credential> {
        self.api_token.as_deref().and_then(Credential::new)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

/// Retry configuration for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each following one.
    pub initial_delay_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.initial_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "piperun-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            upstream: UpstreamConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Read and parse a numeric variable, warning on garbage.
fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: '{}' is not a valid number", name, raw);
            None
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix, upstream settings the
    /// `PIPERUN_` prefix. Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        config.transport = TransportConfig::from_env();

        if let Ok(base_url) = std::env::var("PIPERUN_BASE_URL") {
            config.upstream.base_url = base_url;
        }

        if let Some(timeout) = env_number("PIPERUN_TIMEOUT_SECS") {
            config.upstream.timeout_secs = timeout;
        }

        match std::env::var("PIPERUN_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => {
                config.upstream.api_token = Some(token);
                info!("Default API token loaded from environment");
            }
            _ => {
                warn!(
                    "PIPERUN_API_TOKEN not set - every call must carry its own token"
                );
            }
        }

        if let Some(retries) = env_number("PIPERUN_MAX_RETRIES") {
            config.retry.max_retries = retries;
        }

        if let Some(delay) = env_number("PIPERUN_RETRY_DELAY_MS") {
            config.retry.initial_delay_ms = delay;
        }

        config
    }
}
