//! MCP server implementation for tablets.
//!
//! Exposes tablet search and retrieval as MCP tools for AI editors.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData as McpError, ServerCapabilities, ServerInfo,
    },
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Deserialize;

use crate::cli::{self, OutputFormat};
use crate::commands;
use crate::config::Config;
use crate::render::render;

/// Parameters for `search_tablets` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Space-separated search terms, or a regular expression when regex is true")]
    pub query: String,
    #[schemars(description = "Treat the query as a regular expression (default: false)")]
    pub regex: Option<bool>,
    #[schemars(description = "Result page, starting at 1 (default: 1)")]
    pub page: Option<u64>,
}

/// Parameters for `get_tablet` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetParams {
    #[schemars(description = "Numeric tablet id as returned by search_tablets")]
    pub id: i64,
}

/// MCP server exposing tablet tools.
#[derive(Clone)]
pub struct TabletsServer {
    config: Arc<Config>,
    tool_router: ToolRouter<Self>,
}

fn internal_error(context: &str, e: &anyhow::Error) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::from(format!("{context}: {e}")),
        data: None,
    }
}

#[tool_router]
impl TabletsServer {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Search cuneiform tablet transliterations, ten tablets per page")]
    async fn search_tablets(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let mode = cli::search_mode(params.regex.unwrap_or(false));
        let page = params.page.unwrap_or(1);

        let output =
            commands::search_report(&self.config, &params.query, mode, page, OutputFormat::Text)
                .map_err(|e| internal_error("Search failed", &e))?;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(description = "Get every object, section and line of a tablet as JSON")]
    async fn get_tablet(
        &self,
        Parameters(params): Parameters<GetParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = commands::show(&self.config, params.id, None)
            .and_then(|tablet| render(&tablet, OutputFormat::Json))
            .map_err(|e| internal_error("Failed to get tablet", &e))?;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for TabletsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "tablets searches a corpus of cuneiform tablet transliterations. \
                Use search_tablets to find tablets containing every term (or matching \
                a regular expression) and get_tablet to read one tablet in full."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server with stdio transport.
///
/// # Errors
///
/// Returns an error if the server fails to start or encounters a fatal error.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let server = TabletsServer::new(config);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
