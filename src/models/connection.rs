//! Connection-related data models.
//!
//! This module defines the value describing how to reach a MySQL server and
//! the fixed pool parameters every session uses.

use serde::Serialize;
use std::time::Duration;

/// Port used when the caller does not supply one.
pub const DEFAULT_PORT: &str = "3306";

/// Maximum open connections held by the session pool.
pub const MAX_OPEN_CONNECTIONS: u32 = 10;

/// Maximum lifetime of a pooled connection.
pub const MAX_CONNECTION_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Configuration for a MySQL connection.
///
/// Immutable once constructed; consumed only by the session's `connect`.
#[derive(Clone, Serialize)]
pub struct ConnectionConfig {
    pub host: String,
    /// Kept as text to round-trip exactly what the caller sent.
    pub port: String,
    pub username: String,
    /// Sensitive - never log
    #[serde(skip_serializing)]
    pub password: String,
    /// Default schema. Empty means none.
    pub database: String,
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Result<Self, ConnectionConfigError> {
        let host = host.into().trim().to_string();
        let port = port.into().trim().to_string();
        let username = username.into();

        if host.is_empty() {
            return Err(ConnectionConfigError::EmptyHost);
        }
        if username.trim().is_empty() {
            return Err(ConnectionConfigError::EmptyUsername);
        }
        match port.parse::<u16>() {
            Ok(0) | Err(_) => return Err(ConnectionConfigError::InvalidPort(port)),
            Ok(_) => {}
        }

        Ok(Self {
            host,
            port,
            username,
            password: password.into(),
            database: database.into().trim().to_string(),
        })
    }

    /// Numeric port. Validated at construction.
    pub fn port_number(&self) -> u16 {
        self.port.parse().unwrap_or(3306)
    }

    /// `host:port` as shown to the caller.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default schema, if one was given.
    pub fn database(&self) -> Option<&str> {
        if self.database.is_empty() {
            None
        } else {
            Some(&self.database)
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}

/// Errors that can occur when creating a connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("host is required")]
    EmptyHost,

    #[error("username is required")]
    EmptyUsername,

    #[error("port must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

impl From<ConnectionConfigError> for crate::error::DbError {
    fn from(err: ConnectionConfigError) -> Self {
        crate::error::DbError::invalid_input(err.to_string())
    }
}
