//! Front-end transports for the gateway.
//!
//! - **STDIO**: MCP over standard input/output (default) - feature: `stdio`
//! - **TCP**: MCP over a raw TCP socket - feature: `tcp`
//! - **HTTP**: MCP as JSON-RPC over POST requests - feature: `http`
//! - **REST**: resource routes mirroring the upstream API - feature: `rest`
//!
//! The MCP transports drive the [`McpServer`](crate::core::McpServer) handler;
//! the REST transport talks to the same dispatcher directly. Either way an
//! operation behaves identically.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "rest")]
pub mod rest;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

// Re-export configs for convenience
#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(feature = "rest")]
pub use config::RestConfig;
