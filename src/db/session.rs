//! Database session management.
//!
//! The server holds exactly one [`MySqlSession`], shared by `Arc`. It owns at
//! most one live pool. Connecting replaces that pool and closing discards it.
//! Handlers reach the session through the [`Datastore`] capability trait so
//! they can be driven without a server.

use crate::db::executor::QueryExecutor;
use crate::error::{DbError, DbResult};
use crate::models::{
    ACQUIRE_TIMEOUT, ConnectionConfig, MAX_CONNECTION_LIFETIME, MAX_OPEN_CONNECTIONS,
    PING_TIMEOUT, QueryRequest, QueryResult,
};
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long an idle pooled connection is kept before being closed.
///
/// sqlx bounds idle connections by age rather than by count.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on waiting for a pool to close.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Operations the tool handlers need from a database session.
pub trait Datastore: Send + Sync {
    /// Open a new connection, replacing any existing one.
    fn connect(&self, config: ConnectionConfig) -> impl Future<Output = DbResult<()>> + Send;

    /// Fail with [`DbError::NotConnected`] unless a verified connection is held.
    fn check_connection(&self) -> impl Future<Output = DbResult<()>> + Send;

    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    /// Run one statement against the current connection.
    fn execute(
        &self,
        request: QueryRequest,
    ) -> impl Future<Output = DbResult<QueryResult>> + Send;

    /// Close the current connection. Returns `false` if there was none.
    fn close(&self) -> impl Future<Output = bool> + Send;
}

/// Single-connection MySQL session.
#[derive(Debug, Default)]
pub struct MySqlSession {
    pool: RwLock<Option<MySqlPool>>,
}

impl MySqlSession {
    /// Create a disconnected session.
    pub fn new() -> Self {
        Self::default()
    }

    fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port_number())
            .username(&config.username)
            .password(&config.password)
            .charset("utf8mb4");

        match config.database() {
            Some(database) => options.database(database),
            None => options,
        }
    }

    fn pool_options() -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(MAX_OPEN_CONNECTIONS)
            .max_lifetime(MAX_CONNECTION_LIFETIME)
            .idle_timeout(IDLE_TIMEOUT)
            .acquire_timeout(ACQUIRE_TIMEOUT)
    }

    /// Generate a helpful suggestion for connection errors.
    fn connection_suggestion(error: &DbError) -> String {
        let error_str = error.to_string().to_lowercase();

        if error_str.contains("connection refused") {
            return "Check that the MySQL server is running and accessible".to_string();
        }

        if error_str.contains("access denied") || error_str.contains("password") {
            return "Verify the username and password".to_string();
        }

        if error_str.contains("unknown database") {
            return "Check that the database name exists".to_string();
        }

        if error_str.contains("tls") || error_str.contains("ssl") {
            return "Check TLS/SSL configuration on the server".to_string();
        }

        if matches!(error, DbError::Timeout { .. }) {
            return "Check the host and port, the server did not answer in time".to_string();
        }

        "Verify the host, port and credentials passed to connect".to_string()
    }
}

/// Close a pool, waiting at most [`CLOSE_TIMEOUT`].
async fn close_pool(pool: MySqlPool) {
    if timeout(CLOSE_TIMEOUT, pool.close()).await.is_err() {
        warn!(
            timeout_secs = CLOSE_TIMEOUT.as_secs(),
            "Timed out closing connection pool"
        );
    }
}

impl Datastore for MySqlSession {
    async fn connect(&self, config: ConnectionConfig) -> DbResult<()> {
        // Held for the whole swap so no caller observes a half-open session.
        let mut slot = self.pool.write().await;

        if let Some(previous) = slot.take() {
            info!("Closing existing connection before reconnecting");
            close_pool(previous).await;
        }

        info!(
            host = %config.host,
            port = %config.port,
            username = %config.username,
            database = ?config.database(),
            "Connecting to MySQL"
        );

        let pool = Self::pool_options().connect_lazy_with(Self::connect_options(&config));

        if let Err(e) = QueryExecutor::ping(&pool, PING_TIMEOUT).await {
            close_pool(pool).await;
            warn!(address = %config.address(), error = %e, "Connection verification failed");
            return Err(DbError::connection(
                format!("failed to ping database: {}", e),
                Self::connection_suggestion(&e),
            ));
        }

        *slot = Some(pool);
        info!(address = %config.address(), "Connected to MySQL");
        Ok(())
    }

    async fn check_connection(&self) -> DbResult<()> {
        if self.pool.read().await.is_some() {
            Ok(())
        } else {
            Err(DbError::NotConnected)
        }
    }

    async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn execute(&self, request: QueryRequest) -> DbResult<QueryResult> {
        // Clone the handle so the statement runs without holding the lock.
        let pool = self
            .pool
            .read()
            .await
            .clone()
            .ok_or(DbError::NotConnected)?;

        QueryExecutor::execute(&pool, &request).await
    }

    async fn close(&self) -> bool {
        let mut slot = self.pool.write().await;
        match slot.take() {
            Some(pool) => {
                close_pool(pool).await;
                info!("Connection closed");
                true
            }
            None => {
                debug!("Close requested with no active connection");
                false
            }
        }
    }
}
