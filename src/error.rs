//! Error types for the MySQL MCP client.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each variant carries enough of the underlying cause for an AI assistant to
//! understand what went wrong and how to recover.

use crate::models::ACQUIRE_TIMEOUT;
use std::fmt::Display;
use thiserror::Error;

/// Fixed message returned by every data operation attempted before `connect`.
pub const NOT_CONNECTED_MESSAGE: &str = "not connected to a database, use connect tool first";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{message}")]
    Connection { message: String, suggestion: String },

    #[error("{}", NOT_CONNECTED_MESSAGE)]
    NotConnected,

    #[error("{message}")]
    Execution {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("failed to marshal results to JSON: {message}")]
    Formatting { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create a formatting error.
    pub fn formatting(message: impl Into<String>) -> Self {
        Self::Formatting {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Prefix the message of an execution or connection error with the
    /// operation that failed, e.g. `failed to list databases: <cause>`.
    ///
    /// Other variants already carry a self-describing message and are
    /// returned unchanged.
    pub fn context(self, context: impl Display) -> Self {
        match self {
            Self::Execution { message, sql_state } => Self::Execution {
                message: format!("{}: {}", context, message),
                sql_state,
            },
            Self::Connection {
                message,
                suggestion,
            } => Self::Connection {
                message: format!("{}: {}", context, message),
                suggestion,
            },
            other => other,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::NotConnected => Some("Call the connect tool with host, username and password"),
            Self::Timeout { .. } => {
                Some("Consider narrowing the query or checking server load")
            }
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check host, port and credentials passed to connect",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(db_err.message(), code)
            }
            sqlx::Error::PoolTimedOut => DbError::timeout(
                "connection pool acquire",
                ACQUIRE_TIMEOUT.as_secs() as u32,
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::execution(format!("column not found: {}", col), None)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::execution(
                format!("column index {} out of bounds (len: {})", index, len),
                None,
            ),
            sqlx::Error::ColumnDecode { index, source } => DbError::execution(
                format!("failed to scan column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                DbError::execution(format!("failed to scan row: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => DbError::internal("database worker crashed"),
            _ => DbError::execution(err.to_string(), None),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            DbError::InvalidInput { .. } => rmcp::ErrorData::invalid_params(err.to_string(), data),
            DbError::NotConnected => rmcp::ErrorData::invalid_request(err.to_string(), data),

            // SQL errors are caller errors: surface the SQLSTATE alongside the message
            DbError::Execution { message, sql_state } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, data)
            }

            DbError::Connection { .. }
            | DbError::Timeout { .. }
            | DbError::Formatting { .. }
            | DbError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
