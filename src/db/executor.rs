//! Query execution engine.
//!
//! This module runs one statement against the session pool with:
//! - A per-operation deadline covering acquire, execution and row draining
//! - Verbatim SQL over the text protocol when no parameters are bound
//! - Column discovery that tells "no result set" apart from "zero rows"
//! - Rejection of batches that produce more than one result set
//!
//! Rows are drained from the driver's cursor inside the deadline. The cursor
//! and its pooled connection are released when the drain finishes, fails or
//! times out.

use crate::db::types::{RowProtocol, column_names, decode_row};
use crate::error::{DbError, DbResult};
use crate::models::{QueryRequest, QueryResult};
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError};
use sqlx::{Column, Executor, MySqlPool, Row, Statement};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Query executor that handles statement execution against a MySQL pool.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute a statement and collect its columns and rows.
    pub async fn execute(pool: &MySqlPool, request: &QueryRequest) -> DbResult<QueryResult> {
        let start = Instant::now();

        debug!(
            sql = %request.sql,
            params = request.params.len(),
            timeout_secs = request.timeout.as_secs(),
            "Executing statement"
        );

        let result = match timeout(request.timeout, run(pool, request)).await {
            Ok(result) => result?,
            Err(_) => return Err(timeout_error("query execution", request.timeout)),
        };

        debug!(
            columns = result.columns.len(),
            rows = result.rows.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );

        Ok(result)
    }

    /// Ping the server through the pool, bounded by `deadline`.
    pub async fn ping(pool: &MySqlPool, deadline: Duration) -> DbResult<()> {
        use sqlx::Connection;

        let ping = async {
            let mut conn = pool.acquire().await?;
            conn.ping().await?;
            Ok::<_, sqlx::Error>(())
        };

        match timeout(deadline, ping).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error("ping", deadline)),
        }
    }
}

async fn run(pool: &MySqlPool, request: &QueryRequest) -> DbResult<QueryResult> {
    let protocol = RowProtocol::for_param_count(request.params.len());
    let mut conn = pool.acquire().await?;

    let mut columns: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    {
        // Without parameters, send raw SQL (COM_QUERY) so statements that cannot
        // be prepared still run exactly as written.
        let mut stream = if request.params.is_empty() {
            (&mut *conn).fetch(request.sql.as_str())
        } else {
            let mut query = sqlx::query(&request.sql);
            for param in &request.params {
                query = query.bind(param.as_str());
            }
            query.fetch(&mut *conn)
        };

        while let Some(row) = stream.try_next().await? {
            let header = columns.get_or_insert_with(|| column_names(&row));
            // A later statement in a multi-statement batch.
            if !same_header(header, row.columns().iter().map(|col| col.name())) {
                return Err(DbError::execution(
                    "statement returned more than one result set, run one query at a time",
                    None,
                ));
            }
            rows.push(decode_row(&row, protocol)?);
        }
    }

    let columns = match columns {
        Some(columns) => columns,
        None => result_set_columns(&mut conn, &request.sql).await?,
    };

    Ok(QueryResult::new(columns, rows))
}

/// Whether a row's column names match the header taken from the first row.
fn same_header<'a>(header: &[String], names: impl IntoIterator<Item = &'a str>) -> bool {
    let mut names = names.into_iter();
    header.iter().all(|h| names.next() == Some(h.as_str())) && names.next().is_none()
}

/// MySQL error `ER_UNSUPPORTED_PS`: the command cannot be prepared.
const ER_UNSUPPORTED_PS: u16 = 1295;

/// Columns a statement would produce, for statements that returned no rows.
///
/// An empty vector means the statement does not produce a result set.
/// Statements the server refuses to prepare (some DDL and admin commands)
/// never produce one either.
async fn result_set_columns(conn: &mut MySqlConnection, sql: &str) -> DbResult<Vec<String>> {
    match conn.prepare(sql).await {
        Ok(statement) => Ok(statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()),
        Err(e) => unpreparable_statement(e),
    }
}

/// Map a prepare failure to "no result set" when the server does not support
/// preparing the statement. Every other failure is an execution error.
fn unpreparable_statement(err: sqlx::Error) -> DbResult<Vec<String>> {
    if mysql_error_number(&err) == Some(ER_UNSUPPORTED_PS) {
        debug!(error = %err, "Statement cannot be prepared, treating as no result set");
        return Ok(Vec::new());
    }
    Err(DbError::from(err))
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(MySqlDatabaseError::number),
        _ => None,
    }
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}
