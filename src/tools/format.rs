//! Output formatting utilities for MCP tools.
//!
//! This module provides the output format type and the renderers shared by
//! the query and schema tools:
//! - Markdown table with a `row(s) returned` trailer
//! - Pretty-printed JSON array of column-keyed objects
//! - Single-column list with a `<label>(s) found` trailer
//!
//! NULL is rendered as the literal `NULL` everywhere, including JSON.

use crate::error::{DbError, DbResult};
use crate::models::{CellValue, QueryResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Rendered for statements that produce no result set.
pub const NO_RESULTS_MESSAGE: &str = "Query executed successfully (no results to display)";

const NULL_TEXT: &str = "NULL";

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown table format (default)
    #[default]
    Markdown,
    /// JSON array with one object per row
    Json,
}

pub fn format_value(value: &CellValue) -> String {
    match value.as_text() {
        Some(text) => text.into_owned(),
        None => NULL_TEXT.to_string(),
    }
}

/// Render a result in the requested format.
pub fn render(result: &QueryResult, format: OutputFormat) -> DbResult<String> {
    match format {
        OutputFormat::Markdown => Ok(format_as_markdown(result)),
        OutputFormat::Json => format_as_json(result),
    }
}

pub fn format_as_markdown(result: &QueryResult) -> String {
    if !result.has_columns() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut output = String::new();

    output.push_str(&format!("| {} |\n", result.columns.join(" | ")));
    output.push_str(&"|---".repeat(result.columns.len()));
    output.push_str("|\n");

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(format_value).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    output.push_str(&format!("\n{} row(s) returned", result.row_count()));

    output
}

/// Render rows as a JSON array of objects keyed by column name.
///
/// Keys keep column order. When two columns share a name, the later value
/// replaces the earlier one at the first column's position.
pub fn format_as_json(result: &QueryResult) -> DbResult<String> {
    if !result.has_columns() {
        return Ok(NO_RESULTS_MESSAGE.to_string());
    }

    let objects: Vec<Map<String, JsonValue>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.clone(), JsonValue::String(format_value(value))))
                .collect()
        })
        .collect();

    serde_json::to_string_pretty(&objects).map_err(|e| DbError::formatting(e.to_string()))
}

/// Render the first cell of each row as a one-column list.
pub fn format_as_list(result: &QueryResult, label: &str) -> String {
    let mut output = format!("| {} |\n|----------|\n", label);

    for row in &result.rows {
        let value = row.first().map(format_value).unwrap_or_default();
        output.push_str(&format!("| {} |\n", value));
    }

    output.push_str(&format!("\n{} {}(s) found", result.row_count(), label));

    output
}
