//! Tools domain module.
//!
//! Exposes every catalog operation as an MCP tool. Tools are generated from
//! the operation table rather than written one by one.
//!
//! ## Architecture
//!
//! - `registry.rs` - Tool metadata, credential extraction and dispatch
//! - `formatters.rs` - Human-readable summaries of upstream payloads
//! - `error.rs` - Mapping of gateway failures onto MCP error codes
//!
//! ## Adding a New Tool
//!
//! Add an entry to `OPERATIONS` in `domains/operations/catalog.rs`. The tool,
//! its JSON schema and its REST route follow automatically.

mod error;
pub mod formatters;
mod registry;

pub use error::to_mcp_error;
pub use registry::{CREDENTIAL_ARG, ToolRegistry, input_schema, to_tool};
