//! Data models for the MySQL MCP client.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, DEFAULT_PORT, MAX_CONNECTION_LIFETIME,
    MAX_OPEN_CONNECTIONS,
};
pub use query::{
    ACQUIRE_TIMEOUT, CellValue, METADATA_TIMEOUT, PING_TIMEOUT, QUERY_TIMEOUT, QueryRequest, QueryResult, Row,
};
