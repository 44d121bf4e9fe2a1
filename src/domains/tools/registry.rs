//! Tool Registry - one MCP tool per catalog operation.
//!
//! This module provides:
//! - Tool metadata with JSON-schema argument declarations generated from the
//!   operation table
//! - Tool dispatch: credential extraction, invocation and result formatting
//!
//! Every transport (STDIO/TCP through rmcp, HTTP through JSON-RPC) goes
//! through the same registry.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, JsonObject, Tool},
};
use serde_json::{Map, Value, json};
use tracing::{error, info, instrument};

use super::error::to_mcp_error;
use super::formatters;
use crate::domains::operations::{Dispatcher, GatewayError, OperationSpec};
use crate::domains::upstream::{Credential, resolve_credential};

/// Argument carrying a per-call credential.
pub const CREDENTIAL_ARG: &str = "api_token";

/// Tool registry - exposes the operation table as MCP tools.
#[derive(Clone)]
pub struct ToolRegistry {
    dispatcher: Dispatcher,
    default_credential: Option<Credential>,
}

impl ToolRegistry {
    /// Create a registry. `default_credential` is used when a call carries
    /// no `api_token` argument.
    pub fn new(dispatcher: Dispatcher, default_credential: Option<Credential>) -> Self {
        Self {
            dispatcher,
            default_credential,
        }
    }

    /// Get all tool names, in catalog order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.dispatcher.operations().iter().map(|op| op.name).collect()
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools(&self) -> Vec<Tool> {
        let token_required = self.default_credential.is_none();
        self.dispatcher
            .operations()
            .iter()
            .map(|op| to_tool(op, token_required))
            .collect()
    }

    /// Invoke the tool `name`.
    ///
    /// `api_token` is stripped from the arguments before validation and takes
    /// precedence over the configured default credential.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let operation = self.dispatcher.resolve(name).map_err(to_mcp_error)?;
        let mut args = arguments.unwrap_or_default();

        let explicit = args.remove(CREDENTIAL_ARG);
        let credential = resolve_credential(
            explicit.as_ref().and_then(Value::as_str),
            None,
            None,
            self.default_credential.as_ref(),
        )
        .ok_or_else(|| to_mcp_error(GatewayError::MissingCredential))?;

        info!("Calling tool: {}", name);
        match self.dispatcher.invoke(operation, credential, &args).await {
            Ok(payload) => Ok(success_result(operation, payload)),
            Err(e) => {
                error!("Tool {} failed: {}", name, e);
                Err(to_mcp_error(e))
            }
        }
    }
}

/// Tool metadata for one operation.
pub fn to_tool(operation: &OperationSpec, token_required: bool) -> Tool {
    Tool {
        name: operation.name.into(),
        description: Some(operation.description.into()),
        input_schema: Arc::new(input_schema(operation, token_required)),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// JSON-schema object describing an operation's arguments.
pub fn input_schema(operation: &OperationSpec, token_required: bool) -> JsonObject {
    let mut properties = Map::new();
    properties.insert(
        CREDENTIAL_ARG.to_string(),
        json!({
            "type": "string",
            "description": "PipeRun API token (optional when the server has a default token)"
        }),
    );
    for field in operation.fields {
        properties.insert(
            field.name.to_string(),
            json!({
                "type": field.kind.json_type(),
                "description": field.description
            }),
        );
    }

    let mut required: Vec<&str> = Vec::new();
    if token_required {
        required.push(CREDENTIAL_ARG);
    }
    required.extend(operation.required_fields());

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), json!(required));
    schema
}

/// Summary text plus the raw payload as structured content.
fn success_result(operation: &OperationSpec, payload: Value) -> CallToolResult {
    let summary = formatters::format(operation, &payload);
    CallToolResult {
        content: vec![Content::text(summary)],
        structured_content: payload.is_object().then_some(payload),
        is_error: Some(false),
        meta: None,
    }
}
