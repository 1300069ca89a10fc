//! Tool handler tests driven through an in-memory datastore.
//!
//! No MySQL server is needed: the fake records every request it receives and
//! answers with canned results.

use mcp_mysql_client::db::Datastore;
use mcp_mysql_client::error::{DbError, DbResult};
use mcp_mysql_client::models::{CellValue, ConnectionConfig, QueryRequest, QueryResult};
use mcp_mysql_client::tools::{
    ConnectInput, ConnectToolHandler, DescribeTableInput, DisconnectInput, ListDatabasesInput,
    ListTablesInput, NO_RESULTS_MESSAGE, OutputFormat, QueryInput, QueryToolHandler,
    SchemaToolHandler,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[derive(Default)]
struct FakeDatastore {
    connected: Mutex<bool>,
    fail_connect: Option<String>,
    configs: Mutex<Vec<ConnectionConfig>>,
    requests: Mutex<Vec<QueryRequest>>,
    responses: Mutex<VecDeque<DbResult<QueryResult>>>,
}

impl FakeDatastore {
    fn connected() -> Self {
        Self {
            connected: Mutex::new(true),
            ..Self::default()
        }
    }

    fn respond(self, result: DbResult<QueryResult>) -> Self {
        self.responses.lock().unwrap().push_back(result);
        self
    }

    fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Datastore for FakeDatastore {
    async fn connect(&self, config: ConnectionConfig) -> DbResult<()> {
        self.configs.lock().unwrap().push(config);
        if let Some(message) = &self.fail_connect {
            *self.connected.lock().unwrap() = false;
            return Err(DbError::connection(message.clone(), "check the server"));
        }
        *self.connected.lock().unwrap() = true;
        Ok(())
    }

    async fn check_connection(&self) -> DbResult<()> {
        if *self.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(DbError::NotConnected)
        }
    }

    async fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    async fn execute(&self, request: QueryRequest) -> DbResult<QueryResult> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::no_columns()))
    }

    async fn close(&self) -> bool {
        std::mem::replace(&mut *self.connected.lock().unwrap(), false)
    }
}

fn single_column(name: &str, values: &[&str]) -> QueryResult {
    QueryResult::new(
        vec![name.to_string()],
        values.iter().map(|v| vec![CellValue::from(*v)]).collect(),
    )
}

fn describe_users() -> QueryResult {
    let columns = ["Field", "Type", "Null", "Key", "Default", "Extra"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let row = |values: [Option<&str>; 6]| -> Vec<CellValue> {
        values.into_iter().map(CellValue::from).collect()
    };

    QueryResult::new(
        columns,
        vec![
            row([
                Some("id"),
                Some("int"),
                Some("NO"),
                Some("PRI"),
                None,
                Some("auto_increment"),
            ]),
            row([
                Some("username"),
                Some("varchar(50)"),
                Some("NO"),
                Some(""),
                None,
                Some(""),
            ]),
            row([
                Some("email"),
                Some("varchar(100)"),
                Some("YES"),
                Some(""),
                None,
                Some(""),
            ]),
        ],
    )
}

// =============================================================================
// connect / disconnect
// =============================================================================

/// Test that omitted port and database fall back to their defaults.
#[tokio::test]
async fn test_connect_applies_defaults() {
    let store = Arc::new(FakeDatastore::default());
    let handler = ConnectToolHandler::new(store.clone());

    let input: ConnectInput = serde_json::from_str(
        r#"{"host": "localhost", "username": "root", "password": "password"}"#,
    )
    .unwrap();
    let message = assert_ok!(handler.connect(input).await);

    assert_eq!(message, "Successfully connected to MySQL at localhost:3306");
    let config = store.configs.lock().unwrap()[0].clone();
    assert_eq!(config.port, "3306");
    assert_eq!(config.database(), None);
    assert!(store.is_connected().await);
}

/// Test that invalid arguments are rejected before the datastore is touched.
#[tokio::test]
async fn test_connect_rejects_invalid_config() {
    let store = Arc::new(FakeDatastore::default());
    let handler = ConnectToolHandler::new(store.clone());

    let input: ConnectInput = serde_json::from_str(
        r#"{"host": "", "port": "3306", "username": "root", "password": "pw"}"#,
    )
    .unwrap();
    let err = assert_err!(handler.connect(input).await);

    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert!(store.configs.lock().unwrap().is_empty());
}

/// Test that a failed connect surfaces the datastore's connection error.
#[tokio::test]
async fn test_connect_failure_leaves_disconnected() {
    let store = Arc::new(FakeDatastore {
        fail_connect: Some("failed to ping database: connection refused".to_string()),
        ..FakeDatastore::default()
    });
    let handler = ConnectToolHandler::new(store.clone());

    let input: ConnectInput = serde_json::from_str(
        r#"{"host": "127.0.0.1", "port": "1", "username": "root", "password": "pw"}"#,
    )
    .unwrap();
    let err = assert_err!(handler.connect(input).await);

    assert!(matches!(err, DbError::Connection { .. }));
    assert!(err.to_string().starts_with("failed to ping database"));
    assert!(!store.is_connected().await);
}

#[tokio::test]
async fn test_disconnect_messages() {
    let store = Arc::new(FakeDatastore::connected());
    let handler = ConnectToolHandler::new(store.clone());

    let first = assert_ok!(handler.disconnect(DisconnectInput::default()).await);
    let second = assert_ok!(handler.disconnect(DisconnectInput::default()).await);

    assert_eq!(first, "Disconnected from MySQL");
    assert_eq!(second, "No active connection");
}

// =============================================================================
// Not connected
// =============================================================================

/// Test that every data operation short-circuits before any execution.
#[tokio::test]
async fn test_operations_require_connection() {
    let store = Arc::new(FakeDatastore::default());
    let query = QueryToolHandler::new(store.clone());
    let schema = SchemaToolHandler::new(store.clone());

    let results = vec![
        query
            .query(QueryInput {
                sql: "SELECT 1".to_string(),
                format: OutputFormat::Markdown,
            })
            .await,
        schema.list_databases(ListDatabasesInput::default()).await,
        schema.list_tables(ListTablesInput::default()).await,
        schema
            .describe_table(DescribeTableInput {
                table: "users".to_string(),
                format: OutputFormat::Markdown,
            })
            .await,
    ];

    for result in results {
        let err = assert_err!(result);
        assert_eq!(
            err.to_string(),
            "not connected to a database, use connect tool first"
        );
    }
    assert!(store.requests().is_empty());
}

// =============================================================================
// query
// =============================================================================

/// Test that user SQL is sent verbatim with the query deadline.
#[tokio::test]
async fn test_query_markdown() {
    let store = Arc::new(
        FakeDatastore::connected().respond(Ok(single_column("count", &["3"]))),
    );
    let handler = QueryToolHandler::new(store.clone());

    let sql = "SELECT COUNT(*) as count FROM users";
    let output = assert_ok!(
        handler
            .query(QueryInput {
                sql: sql.to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(output, "| count |\n|---|\n| 3 |\n\n1 row(s) returned");

    let requests = store.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sql, sql);
    assert!(requests[0].params.is_empty());
    assert_eq!(requests[0].timeout, Duration::from_secs(30));
}

#[tokio::test]
async fn test_query_json_renders_null_as_text() {
    let result = QueryResult::new(
        vec!["id".into(), "email".into()],
        vec![vec!["3".into(), CellValue::Null]],
    );
    let store = Arc::new(FakeDatastore::connected().respond(Ok(result)));
    let handler = QueryToolHandler::new(store);

    let output = assert_ok!(
        handler
            .query(QueryInput {
                sql: "SELECT id, email FROM users WHERE id = 3".to_string(),
                format: OutputFormat::Json,
            })
            .await
    );

    assert_eq!(
        output,
        "[\n  {\n    \"id\": \"3\",\n    \"email\": \"NULL\"\n  }\n]"
    );
}

/// Test that statements without a result set render the fixed message.
#[tokio::test]
async fn test_query_without_result_set() {
    let store = Arc::new(FakeDatastore::connected().respond(Ok(QueryResult::no_columns())));
    let handler = QueryToolHandler::new(store);

    let output = assert_ok!(
        handler
            .query(QueryInput {
                sql: "UPDATE users SET email = NULL WHERE id = 42".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(output, NO_RESULTS_MESSAGE);
}

#[tokio::test]
async fn test_query_rejects_empty_sql() {
    let store = Arc::new(FakeDatastore::connected());
    let handler = QueryToolHandler::new(store.clone());

    let err = assert_err!(
        handler
            .query(QueryInput {
                sql: "   ".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn test_query_error_has_context() {
    let store = Arc::new(FakeDatastore::connected().respond(Err(DbError::execution(
        "Table 'testdb.nope' doesn't exist",
        Some("42S02".to_string()),
    ))));
    let handler = QueryToolHandler::new(store);

    let err = assert_err!(
        handler
            .query(QueryInput {
                sql: "SELECT * FROM nope".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(
        err.to_string(),
        "query execution failed: Table 'testdb.nope' doesn't exist"
    );
}

// =============================================================================
// list_databases / list_tables
// =============================================================================

#[tokio::test]
async fn test_list_databases() {
    let store = Arc::new(FakeDatastore::connected().respond(Ok(single_column(
        "Database",
        &["information_schema", "seconddb", "testdb"],
    ))));
    let handler = SchemaToolHandler::new(store.clone());

    let output = assert_ok!(handler.list_databases(ListDatabasesInput::default()).await);

    assert!(output.starts_with("| Database |\n|----------|\n"));
    assert!(output.contains("| testdb |"));
    assert!(output.ends_with("\n3 Database(s) found"));

    let requests = store.requests();
    assert_eq!(requests[0].sql, "SHOW DATABASES");
    assert_eq!(requests[0].timeout, Duration::from_secs(10));
}

#[tokio::test]
async fn test_list_tables_current_database() {
    let store = Arc::new(
        FakeDatastore::connected().respond(Ok(single_column("Tables_in_testdb", &["users"]))),
    );
    let handler = SchemaToolHandler::new(store.clone());

    let output = assert_ok!(handler.list_tables(ListTablesInput::default()).await);

    assert_eq!(output, "| Table |\n|----------|\n| users |\n\n1 Table(s) found");
    assert_eq!(store.requests()[0].sql, "SHOW TABLES");
}

/// Test that a named database is passed as a bound parameter, not spliced into SQL.
#[tokio::test]
async fn test_list_tables_named_database() {
    let store = Arc::new(
        FakeDatastore::connected()
            .respond(Ok(single_column("SCHEMA_NAME", &["seconddb"])))
            .respond(Ok(single_column("TABLE_NAME", &["items"]))),
    );
    let handler = SchemaToolHandler::new(store.clone());

    let output = assert_ok!(
        handler
            .list_tables(ListTablesInput {
                database: "seconddb".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert!(output.contains("items"));
    assert!(output.contains("1 Table(s) found"));

    let requests = store.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].sql.contains("information_schema.SCHEMATA"));
    assert!(requests[1].sql.contains("information_schema.TABLES"));
    for request in &requests {
        assert!(!request.sql.contains("seconddb"));
        assert_eq!(request.params, vec!["seconddb".to_string()]);
    }
}

/// Test that an unknown database is an error, not an empty table list.
#[tokio::test]
async fn test_list_tables_unknown_database() {
    let store = Arc::new(
        FakeDatastore::connected().respond(Ok(single_column("SCHEMA_NAME", &[]))),
    );
    let handler = SchemaToolHandler::new(store.clone());

    let err = assert_err!(
        handler
            .list_tables(ListTablesInput {
                database: "no_such_db".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(
        err.to_string(),
        "failed to switch to database no_such_db: Unknown database 'no_such_db'"
    );
    assert!(matches!(err, DbError::Execution { sql_state: Some(ref s), .. } if s == "42000"));
    // The table listing never runs.
    assert_eq!(store.requests().len(), 1);
}

/// Test that a failing schema lookup surfaces with the database context.
#[tokio::test]
async fn test_list_tables_schema_lookup_error_has_context() {
    let store = Arc::new(FakeDatastore::connected().respond(Err(DbError::execution(
        "Lost connection to MySQL server during query",
        Some("HY000".to_string()),
    ))));
    let handler = SchemaToolHandler::new(store);

    let err = assert_err!(
        handler
            .list_tables(ListTablesInput {
                database: "seconddb".to_string(),
                format: OutputFormat::Json,
            })
            .await
    );

    assert!(
        err.to_string()
            .starts_with("failed to switch to database seconddb: Lost connection")
    );
}

#[tokio::test]
async fn test_list_tables_json() {
    let store = Arc::new(
        FakeDatastore::connected().respond(Ok(single_column("Tables_in_testdb", &["users"]))),
    );
    let handler = SchemaToolHandler::new(store);

    let output = assert_ok!(
        handler
            .list_tables(ListTablesInput {
                database: String::new(),
                format: OutputFormat::Json,
            })
            .await
    );

    assert_eq!(output, "[\n  {\n    \"Tables_in_testdb\": \"users\"\n  }\n]");
}

#[tokio::test]
async fn test_list_tables_error_has_context() {
    let store = Arc::new(FakeDatastore::connected().respond(Err(DbError::execution(
        "No database selected",
        Some("3D000".to_string()),
    ))));
    let handler = SchemaToolHandler::new(store);

    let err = assert_err!(handler.list_tables(ListTablesInput::default()).await);
    assert_eq!(err.to_string(), "failed to list tables: No database selected");
}

// =============================================================================
// describe_table
// =============================================================================

#[tokio::test]
async fn test_describe_table_markdown() {
    let store = Arc::new(FakeDatastore::connected().respond(Ok(describe_users())));
    let handler = SchemaToolHandler::new(store.clone());

    let output = assert_ok!(
        handler
            .describe_table(DescribeTableInput {
                table: "users".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    for expected in [
        "Field", "Type", "Null", "Key", "id", "username", "email", "PRI",
    ] {
        assert!(output.contains(expected), "missing {:?} in {}", expected, output);
    }
    assert!(!output.contains("row(s) returned"));
    assert!(output.ends_with(
        "| email | varchar(100) | YES |  | NULL |  |\nusers table structure described successfully"
    ));

    assert_eq!(store.requests()[0].sql, "DESCRIBE `users`");
    assert_eq!(store.requests()[0].timeout, Duration::from_secs(10));
}

#[tokio::test]
async fn test_describe_table_qualified_name() {
    let store = Arc::new(FakeDatastore::connected().respond(Ok(describe_users())));
    let handler = SchemaToolHandler::new(store.clone());

    assert_ok!(
        handler
            .describe_table(DescribeTableInput {
                table: "testdb.users".to_string(),
                format: OutputFormat::Json,
            })
            .await
    );

    assert_eq!(store.requests()[0].sql, "DESCRIBE `testdb`.`users`");
}

/// Test that a backtick-quoted name may contain dots.
#[tokio::test]
async fn test_describe_table_quoted_name_with_dot() {
    let store = Arc::new(FakeDatastore::connected().respond(Ok(describe_users())));
    let handler = SchemaToolHandler::new(store.clone());

    let output = assert_ok!(
        handler
            .describe_table(DescribeTableInput {
                table: "testdb.`a.b`".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(store.requests()[0].sql, "DESCRIBE `testdb`.`a.b`");
    assert!(output.ends_with("testdb.`a.b` table structure described successfully"));
}

#[tokio::test]
async fn test_describe_table_rejects_empty_name() {
    let store = Arc::new(FakeDatastore::connected());
    let handler = SchemaToolHandler::new(store.clone());

    let err = assert_err!(
        handler
            .describe_table(DescribeTableInput {
                table: String::new(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn test_describe_table_error_has_context() {
    let store = Arc::new(FakeDatastore::connected().respond(Err(DbError::execution(
        "Table 'testdb.nope' doesn't exist",
        Some("42S02".to_string()),
    ))));
    let handler = SchemaToolHandler::new(store);

    let err = assert_err!(
        handler
            .describe_table(DescribeTableInput {
                table: "nope".to_string(),
                format: OutputFormat::Markdown,
            })
            .await
    );

    assert_eq!(
        err.to_string(),
        "failed to describe table nope: Table 'testdb.nope' doesn't exist"
    );
}
