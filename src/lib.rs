//! PipeRun CRM gateway.
//!
//! Translates calls from two front ends into requests against the PipeRun CRM
//! REST API:
//!
//! - a **REST** server whose routes mirror the upstream API
//! - an **MCP** server exposing one tool per CRM operation
//!
//! Both are driven by the same operation table, validator and retry-aware
//! request executor.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server and the transports
//! - **domains**: business logic
//!   - **upstream**: call descriptors, retry policy, HTTP transport, executor
//!   - **operations**: operation catalog, argument validation, dispatch
//!   - **tools**: MCP tool registry and response formatters
//!
//! # Example
//!
//! ```rust,no_run
//! use piperun_gateway::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
