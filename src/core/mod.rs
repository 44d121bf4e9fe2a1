//! Core module containing shared infrastructure components.
//!
//! Configuration, error handling, the MCP server handler and the front-end
//! transports.

pub mod config;
pub mod error;
pub mod server;
pub mod transport;

pub use config::{Config, LoggingConfig};
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
