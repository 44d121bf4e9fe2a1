//! Mapping of gateway failures onto MCP protocol errors.

use rmcp::ErrorData as McpError;
use rmcp::model::ErrorCode;
use tracing::warn;

use crate::domains::operations::GatewayError;

/// Convert a gateway failure into the protocol error returned to the client.
///
/// - validation, missing credential, upstream 4xx rejection: invalid params
/// - unknown tool: method not found
/// - auth failure, missing resource: invalid request
/// - everything else: internal error
pub fn to_mcp_error(error: GatewayError) -> McpError {
    let message = error.to_string();
    let data = error.details().cloned();

    match error {
        GatewayError::Validation { .. }
        | GatewayError::MissingCredential
        | GatewayError::Rejected { .. } => McpError::invalid_params(message, data),
        GatewayError::UnknownOperation(name) => {
            warn!("Unknown tool requested: {}", name);
            McpError::new(ErrorCode::METHOD_NOT_FOUND, message, None)
        }
        GatewayError::Auth { .. } => McpError::invalid_request(message, None),
        GatewayError::NotFound { .. } => McpError::invalid_request(message, data),
        GatewayError::RateLimited { .. }
        | GatewayError::Upstream { .. }
        | GatewayError::Internal(_) => McpError::internal_error(message, data),
    }
}

impl From<GatewayError> for McpError {
    fn from(error: GatewayError) -> Self {
        to_mcp_error(error)
    }
}
