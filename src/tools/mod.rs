//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `connect`: Open a session to a MySQL server
//! - `disconnect`: Close the session
//! - `query`: Execute arbitrary SQL
//! - `list_databases`: List databases on the server
//! - `list_tables`: List tables in a database
//! - `describe_table`: Show a table's columns
//! - `format`: Shared markdown/JSON renderers

pub mod connect;
pub mod format;
pub mod query;
pub mod schema;

pub use connect::{ConnectInput, ConnectToolHandler, DisconnectInput};
pub use format::{NO_RESULTS_MESSAGE, OutputFormat};
pub use query::{QueryInput, QueryToolHandler};
pub use schema::{
    DescribeTableInput, ListDatabasesInput, ListTablesInput, SchemaToolHandler, quote_identifier,
};
