//! Connection management tools.
//!
//! This module implements the `connect` and `disconnect` MCP tools.

use crate::db::Datastore;
use crate::error::DbResult;
use crate::models::{ConnectionConfig, DEFAULT_PORT};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::info;

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

/// Accept the port as a JSON string or number.
fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}

/// Input for the connect tool.
#[derive(Clone, Deserialize, JsonSchema)]
pub struct ConnectInput {
    /// MySQL server hostname or IP address
    pub host: String,
    /// MySQL server port. Default: 3306
    #[serde(
        default = "default_port",
        deserialize_with = "port_from_string_or_number"
    )]
    #[schemars(with = "String")]
    pub port: String,
    /// MySQL username
    pub username: String,
    /// MySQL password
    pub password: String,
    /// Default database to use. Omit to connect without one.
    #[serde(default)]
    pub database: String,
}

impl std::fmt::Debug for ConnectInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectInput")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}

/// Input for the disconnect tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DisconnectInput {}

/// Handler for connect and disconnect.
pub struct ConnectToolHandler<D> {
    session: Arc<D>,
}

impl<D: Datastore> ConnectToolHandler<D> {
    /// Create a new connect tool handler.
    pub fn new(session: Arc<D>) -> Self {
        Self { session }
    }

    /// Open a session, replacing any existing one.
    pub async fn connect(&self, input: ConnectInput) -> DbResult<String> {
        let config = ConnectionConfig::new(
            input.host,
            input.port,
            input.username,
            input.password,
            input.database,
        )?;
        let address = config.address();

        self.session.connect(config).await?;

        info!(address = %address, "Connect tool completed");
        Ok(format!("Successfully connected to MySQL at {}", address))
    }

    pub async fn disconnect(&self, _input: DisconnectInput) -> DbResult<String> {
        let message = if self.session.close().await {
            "Disconnected from MySQL"
        } else {
            "No active connection"
        };
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_input_defaults() {
        let json = r#"{"host": "localhost", "username": "root", "password": "pw"}"#;
        let input: ConnectInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.port, "3306");
        assert_eq!(input.database, "");
    }

    #[test]
    fn test_connect_input_numeric_port() {
        let json = r#"{"host": "localhost", "port": 3307, "username": "root", "password": "pw"}"#;
        let input: ConnectInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.port, "3307");
    }

    #[test]
    fn test_connect_input_requires_password() {
        let json = r#"{"host": "localhost", "username": "root"}"#;
        assert!(serde_json::from_str::<ConnectInput>(json).is_err());
    }

    #[test]
    fn test_connect_input_debug_masks_password() {
        let json = r#"{"host": "h", "username": "u", "password": "hunter2"}"#;
        let input: ConnectInput = serde_json::from_str(json).unwrap();
        assert!(!format!("{:?}", input).contains("hunter2"));
    }
}
