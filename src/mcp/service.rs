//! MCP service implementation using rmcp.
//!
//! This module defines the MySqlService struct with all database tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::db::MySqlSession;
use crate::error::DbResult;
use crate::tools::connect::{ConnectInput, ConnectToolHandler, DisconnectInput};
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{
    DescribeTableInput, ListDatabasesInput, ListTablesInput, SchemaToolHandler,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// Wrap handler text in a tool result, mapping failures to MCP errors.
fn text_result(result: DbResult<String>) -> Result<CallToolResult, McpError> {
    result
        .map(|text| CallToolResult::success(vec![Content::text(text)]))
        .map_err(McpError::from)
}

#[derive(Clone)]
pub struct MySqlService {
    /// Session shared by every tool call
    session: Arc<MySqlSession>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MySqlService {
    /// Create a new MySqlService instance around the server's session.
    pub fn new(session: Arc<MySqlSession>) -> Self {
        Self {
            session,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl MySqlService {
    #[tool(
        description = "Connect to a MySQL database.\nReplaces any existing connection. Port defaults to 3306; database is optional."
    )]
    async fn connect(
        &self,
        Parameters(input): Parameters<ConnectInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = ConnectToolHandler::new(self.session.clone());
        text_result(handler.connect(input).await)
    }

    #[tool(description = "Close the current MySQL connection.")]
    async fn disconnect(&self) -> Result<CallToolResult, McpError> {
        let handler = ConnectToolHandler::new(self.session.clone());
        text_result(handler.disconnect(DisconnectInput::default()).await)
    }

    #[tool(
        description = "Execute a SQL query on the connected MySQL database.\nThe SQL is sent as-is. Output format: markdown (default) or json.\nStatements without a result set (INSERT, UPDATE, DDL) return a confirmation message."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.session.clone());
        text_result(handler.query(input).await)
    }

    #[tool(description = "List all databases on the MySQL server.")]
    async fn list_databases(&self) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.session.clone());
        text_result(handler.list_databases(ListDatabasesInput::default()).await)
    }

    #[tool(
        description = "List all tables in the current database, or in `database` when given.\nOutput format: markdown (default) or json."
    )]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.session.clone());
        text_result(handler.list_tables(input).await)
    }

    #[tool(
        description = "Describe the structure of a table (columns, types, nullability, keys, defaults).\nUse `db.table` for a table outside the current database.\nOutput format: markdown (default) or json."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.session.clone());
        text_result(handler.describe_table(input).await)
    }
}

#[tool_handler]
impl ServerHandler for MySqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-mysql-client".to_owned(),
                title: Some("MySQL MCP Client".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for querying a MySQL database.\n\
                \n\
                ## Workflow\n\
                1. Call `connect` with host, username and password (port defaults to 3306)\n\
                2. Explore with `list_databases`, `list_tables` and `describe_table`\n\
                3. Run SQL with `query`\n\
                4. Call `disconnect` when done\n\
                \n\
                Only one connection is held at a time; calling `connect` again replaces it.\n\
                \n\
                ## Error: not connected\n\
                If you see \"not connected to a database\", call `connect` first."
                    .to_string(),
            ),
        }
    }
}
