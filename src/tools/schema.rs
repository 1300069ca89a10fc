//! Schema introspection tools.
//!
//! This module implements the `list_databases`, `list_tables` and
//! `describe_table` MCP tools.

use crate::db::Datastore;
use crate::error::{DbError, DbResult};
use crate::models::{METADATA_TIMEOUT, QueryRequest};
use crate::tools::format::{self, OutputFormat};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const LIST_DATABASES_SQL: &str = "SHOW DATABASES";

const LIST_TABLES_SQL: &str = "SHOW TABLES";

const SCHEMA_EXISTS_SQL: &str =
    "SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?";

/// Scoped to one schema without `USE`, which would only switch a single
/// pooled connection.
const LIST_TABLES_IN_SCHEMA_SQL: &str = "SELECT TABLE_NAME FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME";

/// Input for the list_databases tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListDatabasesInput {}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database to list tables from. Omit to use the connection's default database.
    #[serde(default)]
    pub database: String,
    /// Output format: "markdown" (default) or "json"
    #[serde(default)]
    pub format: OutputFormat,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe. Use `db.table` for a table outside the
    /// default database. Wrap a name containing dots in backticks, e.g. `` `a.b` ``.
    pub table: String,
    /// Output format: "markdown" (default) or "json"
    #[serde(default)]
    pub format: OutputFormat,
}

/// Backtick-quote a possibly schema-qualified identifier.
///
/// Each dot-separated part is quoted on its own and embedded backticks are
/// doubled, so `testdb.users` becomes `` `testdb`.`users` ``. A part already
/// wrapped in backticks is taken as written and may contain dots.
pub fn quote_identifier(name: &str) -> DbResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::invalid_input("table is required"));
    }

    let parts = split_identifier(name)
        .filter(|parts| parts.len() <= 2 && parts.iter().all(|part| !part.is_empty()))
        .ok_or_else(|| {
            DbError::invalid_input(format!(
                "invalid table name '{}', expected 'table' or 'database.table'",
                name
            ))
        })?;

    Ok(parts
        .iter()
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join("."))
}

/// Split a name on dots outside backtick-quoted parts, unescaping doubled
/// backticks inside them. Returns `None` for an unterminated quote or text
/// after a closing quote.
fn split_identifier(name: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut chars = name.chars().peekable();

    loop {
        let mut part = String::new();
        if chars.next_if_eq(&'`').is_some() {
            loop {
                match chars.next()? {
                    '`' if chars.next_if_eq(&'`').is_some() => part.push('`'),
                    '`' => break,
                    c => part.push(c),
                }
            }
            if !matches!(chars.peek(), None | Some(&'.')) {
                return None;
            }
        } else {
            while let Some(c) = chars.next_if(|&c| c != '.') {
                part.push(c);
            }
        }
        parts.push(part);

        // Either a dot or the end of the name.
        if chars.next().is_none() {
            return Some(parts);
        }
    }
}

/// Handler for schema introspection.
pub struct SchemaToolHandler<D> {
    session: Arc<D>,
}

impl<D: Datastore> SchemaToolHandler<D> {
    /// Create a new schema tool handler.
    pub fn new(session: Arc<D>) -> Self {
        Self { session }
    }

    pub async fn list_databases(&self, _input: ListDatabasesInput) -> DbResult<String> {
        self.session.check_connection().await?;

        let result = self
            .session
            .execute(QueryRequest::new(LIST_DATABASES_SQL, METADATA_TIMEOUT))
            .await
            .map_err(|e| e.context("failed to list databases"))?;

        info!(count = result.row_count(), "Listed databases");
        Ok(format::format_as_list(&result, "Database"))
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<String> {
        self.session.check_connection().await?;

        let database = input.database.trim();
        if !database.is_empty() {
            self.ensure_database_exists(database)
                .await
                .map_err(|e| e.context(format!("failed to switch to database {}", database)))?;
        }

        let request = if database.is_empty() {
            QueryRequest::new(LIST_TABLES_SQL, METADATA_TIMEOUT)
        } else {
            QueryRequest::new(LIST_TABLES_IN_SCHEMA_SQL, METADATA_TIMEOUT).with_param(database)
        };

        let result = self
            .session
            .execute(request)
            .await
            .map_err(|e| e.context("failed to list tables"))?;

        info!(
            database = %database,
            count = result.row_count(),
            "Listed tables"
        );

        match input.format {
            OutputFormat::Markdown => Ok(format::format_as_list(&result, "Table")),
            OutputFormat::Json => format::format_as_json(&result),
        }
    }

    /// An unknown schema matches no rows in `information_schema.TABLES`, so
    /// check it first.
    async fn ensure_database_exists(&self, database: &str) -> DbResult<()> {
        let result = self
            .session
            .execute(QueryRequest::new(SCHEMA_EXISTS_SQL, METADATA_TIMEOUT).with_param(database))
            .await?;

        if result.row_count() == 0 {
            return Err(DbError::execution(
                format!("Unknown database '{}'", database),
                Some("42000".to_string()),
            ));
        }
        Ok(())
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<String> {
        self.session.check_connection().await?;

        let table = input.table.trim();
        let sql = format!("DESCRIBE {}", quote_identifier(table)?);

        let result = self
            .session
            .execute(QueryRequest::new(sql, METADATA_TIMEOUT))
            .await
            .map_err(|e| e.context(format!("failed to describe table {}", table)))?;

        info!(table = %table, columns = result.row_count(), "Described table");

        match input.format {
            OutputFormat::Markdown => {
                let rendered = format::format_as_markdown(&result);
                // Replace the generic row count with a table-specific summary.
                let body = match rendered.rsplit_once("\n\n") {
                    Some((body, _)) => body,
                    None => rendered.as_str(),
                };
                Ok(format!(
                    "{}\n{} table structure described successfully",
                    body, table
                ))
            }
            OutputFormat::Json => format::format_as_json(&result),
        }
    }
}
