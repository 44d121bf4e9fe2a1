//! STDIO transport implementation.
//!
//! MCP over standard input/output, the mode MCP clients spawn by default.
//! Stdout carries protocol frames only; logs go to stderr.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve one MCP session on stdin/stdout until the client disconnects.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let tool_count = server.tools().tool_names().len();
        if server.default_credential().is_none() {
            info!("No default API token - tool calls must pass api_token");
        }

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        info!("Ready - {} tools available over stdin/stdout", tool_count);

        service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!("Client disconnected, STDIO session closed");
        Ok(())
    }
}
