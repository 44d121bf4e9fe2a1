//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Front end the gateway serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// MCP over standard input/output (default).
    #[cfg(feature = "stdio")]
    Stdio,

    /// MCP over a TCP socket.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// MCP as JSON-RPC over HTTP POST.
    #[cfg(feature = "http")]
    Http(HttpConfig),

    /// Plain REST routes mirroring the upstream API.
    #[cfg(feature = "rest")]
    Rest(RestConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

/// REST front end configuration.
#[cfg(feature = "rest")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    pub port: u16,

    #[serde(default = "default_rest_host")]
    pub host: String,

    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "rest")]
fn default_rest_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(any(feature = "http", feature = "rest"))]
fn default_cors() -> bool {
    true
}

/// Parse a boolean flag; anything but `false`/`0` enables it.
#[cfg(any(feature = "http", feature = "rest"))]
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(true)
}

#[cfg(any(feature = "tcp", feature = "http", feature = "rest"))]
fn env_port(name: &str) -> Option<u16> {
    std::env::var(name).ok().and_then(|p| p.parse().ok())
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(all(
            not(feature = "stdio"),
            not(feature = "tcp"),
            not(feature = "http"),
            feature = "rest"
        ))]
        {
            return Self::Rest(RestConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http", feature = "rest")))]
        {
            compile_error!(
                "At least one transport feature must be enabled: stdio, tcp, http, or rest"
            );
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

#[cfg(feature = "rest")]
impl Default for RestConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_rest_host(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create a TCP transport config.
    #[cfg(feature = "tcp")]
    pub fn tcp(port: u16, host: impl Into<String>) -> Self {
        Self::Tcp(TcpConfig {
            port,
            host: host.into(),
        })
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Create a REST front end config.
    #[cfg(feature = "rest")]
    pub fn rest(port: u16, host: impl Into<String>) -> Self {
        Self::Rest(RestConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => {
                let port = env_port("MCP_TCP_PORT").unwrap_or(3000);
                let host = std::env::var("MCP_TCP_HOST").unwrap_or_else(|_| default_host());
                Self::Tcp(TcpConfig { port, host })
            }
            #[cfg(feature = "http")]
            "http" => {
                let port = env_port("MCP_HTTP_PORT").unwrap_or(8080);
                let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
                let rpc_path =
                    std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path());
                Self::Http(HttpConfig {
                    port,
                    host,
                    rpc_path,
                    enable_cors: env_flag("MCP_HTTP_CORS"),
                })
            }
            #[cfg(feature = "rest")]
            "rest" => {
                let port = env_port("MCP_REST_PORT")
                    .or_else(|| env_port("PORT"))
                    .unwrap_or(3000);
                let host =
                    std::env::var("MCP_REST_HOST").unwrap_or_else(|_| default_rest_host());
                Self::Rest(RestConfig {
                    port,
                    host,
                    enable_cors: env_flag("MCP_REST_CORS"),
                })
            }
            _ => Self::default(),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
            #[cfg(feature = "rest")]
            Self::Rest(cfg) => format!("REST on {}:{}", cfg.host, cfg.port),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "rest")]
    #[test]
    fn test_rest_defaults() {
        let cfg = RestConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert!(cfg.enable_cors);
        assert_eq!(
            TransportConfig::rest(4000, "127.0.0.1").description(),
            "REST on 127.0.0.1:4000"
        );
    }

    #[cfg(feature = "stdio")]
    #[test]
    fn test_default_is_stdio() {
        assert!(TransportConfig::default().is_stdio());
    }
}
