//! MySQL driver implementation.
//!
//! Provides `MySqlDriver` and `MySqlSession`, which implement the `Driver`
//! and `Session` traits over a single `sqlx::MySqlConnection`. No pool is
//! involved: every session is one physical connection.

use crate::config::ConnectionConfig;
use crate::db::{BoundValue, Driver, ExecOutcome, Row, Session, Value};
use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use tracing::debug;

/// Opens plain sqlx MySQL connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDriver;

#[async_trait]
impl Driver for MySqlDriver {
    async fn open(&self, connection_string: &str) -> Result<Box<dyn Session>> {
        let config = ConnectionConfig::from_connection_string(connection_string)?;
        let url = config.to_connection_string()?;

        debug!("Opening MySQL connection to {}", config.display_string());

        let conn = MySqlConnection::connect(&url)
            .await
            .map_err(|e| map_connection_error(e, &config))?;

        Ok(Box::new(MySqlSession { conn }))
    }
}

/// One open MySQL connection.
#[derive(Debug)]
pub struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn fetch_rows(&mut self, sql: &str, binds: &[BoundValue]) -> Result<Option<Vec<Row>>> {
        let statement = (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(|e| ExecutorError::query(format_query_error(e)))?;
        let has_columns = !statement.columns().is_empty();

        let rows = bind_all(statement.query(), binds)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ExecutorError::query(format_query_error(e)))?;

        debug!("Statement returned {} rows", rows.len());
        // CALL reports no columns up front, so rows also mark a result set
        if !has_columns && rows.is_empty() {
            return Ok(None);
        }
        rows.iter().map(convert_row).collect::<Result<Vec<_>>>().map(Some)
    }

    async fn execute(&mut self, sql: &str, binds: &[BoundValue]) -> Result<ExecOutcome> {
        let query = bind_all(sqlx::query(sql), binds);

        let result = query
            .execute(&mut self.conn)
            .await
            .map_err(|e| ExecutorError::query(format_query_error(e)))?;

        debug!(
            "Statement affected {} rows, last insert id {}",
            result.rows_affected(),
            result.last_insert_id()
        );
        Ok(ExecOutcome {
            last_insert_id: result.last_insert_id(),
            rows_affected: result.rows_affected(),
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| ExecutorError::connection(format!("Failed to close connection: {e}")))
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    binds: &[BoundValue],
) -> Query<'q, MySql, MySqlArguments> {
    for value in binds {
        query = match value {
            BoundValue::Integer(i) => query.bind(*i),
            BoundValue::VarChar(s) => query.bind(s.clone()),
            BoundValue::DateTime(ts) => query.bind(*ts),
            BoundValue::Null => query.bind(None::<String>),
        };
    }
    query
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.name(), col.type_info().name()))
        .collect()
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Non-NULL cells that cannot be decoded are errors, never NULL.
fn convert_value(row: &MySqlRow, index: usize, column: &str, type_name: &str) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| decode_error(column, type_name, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name.to_uppercase().as_str() {
        "BOOLEAN" | "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
            row.try_get::<i64, _>(index).map(Value::Int)
        }

        // YEAR is flagged unsigned and BIT arrives as big-endian bytes
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "YEAR" | "BIT" => row
            .try_get::<u64, _>(index)
            .map(|v| i64::try_from(v).map(Value::Int).unwrap_or(Value::UInt(v))),

        "FLOAT" => row.try_get::<f32, _>(index).map(|v| Value::Float(v as f64)),

        "DOUBLE" | "REAL" => row.try_get::<f64, _>(index).map(Value::Float),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            row.try_get::<Vec<u8>, _>(index).map(Value::Bytes)
        }

        // stored as length-prefixed WKB, which sqlx has no checked type for
        "GEOMETRY" => row.try_get_unchecked::<Vec<u8>, _>(index).map(Value::Bytes),

        "DATETIME" | "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map(Value::Timestamp),

        "DATE" => row.try_get::<NaiveDate, _>(index).map(Value::Date),

        // TIME spans -838:59:59 to 838:59:59, wider than a time of day
        "TIME" => row.try_get::<NaiveTime, _>(index).map(Value::Time).or_else(|_| {
            row.try_get::<MySqlTime, _>(index)
                .map(|t| Value::String(t.to_string()))
        }),

        // DECIMAL, JSON, ENUM, SET and the character types
        _ => row.try_get_unchecked::<String, _>(index).map(Value::String),
    };

    value.map_err(|e| decode_error(column, type_name, e))
}

fn decode_error(column: &str, type_name: &str, error: sqlx::Error) -> ExecutorError {
    ExecutorError::conversion(format!(
        "Cannot read column '{column}' of type {type_name}: {error}"
    ))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ExecutorError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ExecutorError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        ExecutorError::connection(format!(
            "Access denied for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        ExecutorError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        ExecutorError::connection(format!(
            "TLS negotiation with {host}:{port} failed. Adjust the ssl-mode option."
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ExecutorError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ExecutorError::connection(error.to_string())
    }
}

/// Formats a query error, prefixing the MySQL error number when available.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        if let Some(mysql_error) = db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            return format!("ERROR {}: {}", mysql_error.number(), db_error.message());
        }
        return format!("ERROR: {}", db_error.message());
    }

    error.to_string()
}
