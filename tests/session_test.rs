//! Session lifecycle tests that need no MySQL server.

use mcp_mysql_client::db::{Datastore, MySqlSession};
use mcp_mysql_client::error::DbError;
use mcp_mysql_client::models::{ConnectionConfig, QUERY_TIMEOUT, QueryRequest};
use mcp_mysql_client::tools::{ConnectInput, ConnectToolHandler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_test::assert_err;

/// Test that a fresh session reports not connected for every data path.
#[tokio::test]
async fn test_check_before_connect() {
    let session = MySqlSession::new();

    assert!(!session.is_connected().await);
    let err = assert_err!(session.check_connection().await);
    assert!(matches!(err, DbError::NotConnected));

    let err = assert_err!(
        session
            .execute(QueryRequest::new("SELECT 1", QUERY_TIMEOUT))
            .await
    );
    assert!(matches!(err, DbError::NotConnected));
}

/// Test that invalid connect arguments never reach the network.
#[tokio::test]
async fn test_invalid_config_rejected() {
    let session = Arc::new(MySqlSession::new());
    let handler = ConnectToolHandler::new(session.clone());

    let input: ConnectInput = serde_json::from_str(
        r#"{"host": "localhost", "port": "not-a-port", "username": "root", "password": "pw"}"#,
    )
    .unwrap();
    let err = assert_err!(handler.connect(input).await);

    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert!(!session.is_connected().await);
}

/// Test that an unreachable server leaves the session disconnected.
#[tokio::test]
async fn test_unreachable_host_leaves_disconnected() {
    let session = MySqlSession::new();
    let config = ConnectionConfig::new("127.0.0.1", "1", "root", "password", "").unwrap();

    let start = Instant::now();
    let err = assert_err!(session.connect(config).await);

    assert!(matches!(err, DbError::Connection { .. }), "got {:?}", err);
    assert!(err.to_string().starts_with("failed to ping database: "));
    assert!(err.suggestion().is_some());
    assert!(!session.is_connected().await);
    // Ping deadline plus pool close grace.
    assert!(start.elapsed() < Duration::from_secs(15));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let session = MySqlSession::new();

    assert!(!session.close().await);
    assert!(!session.close().await);
    assert!(!session.is_connected().await);
}
