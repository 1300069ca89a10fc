//! MySQL MCP Client Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to connect to a MySQL server, run SQL and inspect its schema.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use db::{Datastore, MySqlSession};
pub use error::DbError;
pub use mcp::MySqlService;
