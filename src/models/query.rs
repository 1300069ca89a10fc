//! Query-related data models.
//!
//! This module defines the request handed to the executor and the
//! column/row shape it produces.

use std::borrow::Cow;
use std::time::Duration;

/// Deadline for verifying a freshly opened connection.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest wait for a pooled connection to become available.
pub const ACQUIRE_TIMEOUT: Duration = PING_TIMEOUT;

/// Deadline for catalog lookups (list databases/tables, describe table).
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for arbitrary caller-supplied SQL.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// A single cell as returned by the server.
///
/// `Raw` exists because MySQL reports some text columns (catalog names,
/// binary collations) as byte strings; renderers decode them as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Null,
    Text(String),
    Raw(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text form of the cell. `None` for NULL.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(Cow::Borrowed(s)),
            Self::Raw(bytes) => Some(String::from_utf8_lossy(bytes)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One result row, positionally aligned with `QueryResult::columns`.
///
/// A vector rather than a map because column names may repeat.
pub type Row = Vec<CellValue>;

/// Columns and rows of one executed statement.
///
/// An empty `columns` means the statement did not produce a result set
/// (INSERT, UPDATE, DDL...), which is distinct from a result set with no rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Result of a statement that produced no result set.
    pub fn no_columns() -> Self {
        Self::default()
    }

    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub sql: String,
    /// Positional `?` parameters. Empty for caller-supplied SQL, which is sent verbatim.
    pub params: Vec<String>,
    pub timeout: Duration,
}

impl QueryRequest {
    /// Create a new request with the given deadline.
    pub fn new(sql: impl Into<String>, timeout: Duration) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            timeout,
        }
    }

    /// Add a parameter to this query.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }
}
