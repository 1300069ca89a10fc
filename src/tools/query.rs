//! Query execution tool.
//!
//! This module implements the `query` MCP tool. The SQL is sent to the server
//! exactly as given; statements without a result set render a fixed message.

use crate::db::Datastore;
use crate::error::{DbError, DbResult};
use crate::models::{QUERY_TIMEOUT, QueryRequest};
use crate::tools::format::{self, OutputFormat};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL statement to execute
    pub sql: String,
    /// Output format: "markdown" (default) returns a markdown table, "json" returns an array of row objects
    #[serde(default)]
    pub format: OutputFormat,
}

/// Handler for query execution.
pub struct QueryToolHandler<D> {
    session: Arc<D>,
}

impl<D: Datastore> QueryToolHandler<D> {
    /// Create a new query tool handler.
    pub fn new(session: Arc<D>) -> Self {
        Self { session }
    }

    /// Handle the query tool call.
    pub async fn query(&self, input: QueryInput) -> DbResult<String> {
        self.session.check_connection().await?;

        if input.sql.trim().is_empty() {
            return Err(DbError::invalid_input("sql is required"));
        }

        let request = QueryRequest::new(input.sql, QUERY_TIMEOUT);
        let result = self
            .session
            .execute(request)
            .await
            .map_err(|e| e.context("query execution failed"))?;

        info!(
            columns = result.columns.len(),
            row_count = result.row_count(),
            format = ?input.format,
            "Query executed"
        );

        format::render(&result, input.format)
    }
}
