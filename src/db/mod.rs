//! Database access layer.
//!
//! This module provides database access functionality:
//! - The session that owns the connection pool
//! - Statement execution with deadlines
//! - Column type decoding

pub mod executor;
pub mod session;
pub mod types;

pub use executor::QueryExecutor;
pub use session::{Datastore, MySqlSession};
