//! Domains module containing the gateway's business logic.
//!
//! - **upstream**: calling the CRM API with retry
//! - **operations**: the operation table, validation and dispatch
//! - **tools**: exposing operations as MCP tools

pub mod operations;
pub mod tools;
pub mod upstream;
