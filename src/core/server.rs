//! MCP Server implementation and lifecycle management.
//!
//! This module contains the server handler that exposes the operation table as
//! MCP tools. The handler is transport-agnostic: STDIO and TCP drive it through
//! rmcp, the HTTP transport through the JSON helpers below.
//!
//! ## Tool Architecture
//!
//! Tools are not written by hand. Every entry of the operation catalog in
//! `domains/operations/catalog.rs` becomes one tool, with its JSON schema
//! generated from the entry's field declarations.
//! **Adding an operation does NOT require modifying this file!**

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use tracing::{info, instrument};

use super::config::Config;
use super::error::{Error, Result};
use crate::domains::operations::Dispatcher;
use crate::domains::tools::ToolRegistry;
use crate::domains::upstream::{Credential, ReqwestTransport, RequestExecutor};

const INSTRUCTIONS: &str = "Gateway to the PipeRun CRM API. Every tool maps to one CRM \
operation (deals, persons, companies, activities, notes, pipelines and catalogues). \
Pass `api_token` unless the server was started with a default token.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool registry backed by the operation dispatcher.
    tools: ToolRegistry,

    dispatcher: Dispatcher,
}

impl McpServer {
    /// Create a server talking to the upstream API described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        if config.upstream.base_url.trim().is_empty() {
            return Err(Error::config("upstream base URL must not be empty"));
        }

        let transport =
            ReqwestTransport::new(&config.upstream.base_url, config.upstream.timeout())?;
        let executor = RequestExecutor::new(Arc::new(transport), config.retry.policy());

        Ok(Self::with_dispatcher(config, Dispatcher::new(executor)))
    }

    /// Create a server around an existing dispatcher.
    pub fn with_dispatcher(config: Config, dispatcher: Dispatcher) -> Self {
        let tools = ToolRegistry::new(dispatcher.clone(), config.upstream.default_credential());
        Self {
            config: Arc::new(config),
            tools,
            dispatcher,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The dispatcher shared by every front end.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Process-wide default credential, if configured.
    pub fn default_credential(&self) -> Option<Credential> {
        self.config.upstream.default_credential()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools as JSON (for HTTP transport).
    pub fn list_tools_json(&self) -> Vec<serde_json::Value> {
        self.tools
            .get_all_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name and serialize the result (for HTTP transport).
    pub async fn call_tool_json(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, McpError> {
        let arguments = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            _ => {
                return Err(McpError::invalid_params(
                    "Tool arguments must be an object",
                    None,
                ));
            }
        };

        let result = self.tools.call_tool(name, arguments).await?;
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tools.get_all_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        self.tools.call_tool(&request.name, request.arguments).await
    }
}
