//! Database abstraction layer for myexec.
//!
//! Provides a trait-based seam between the query executor and the MySQL
//! driver, so the executor can be exercised against a scripted driver.

mod mock;
mod mysql;
mod types;

pub use mock::{MockDriver, MockScript, RecordedStatement};
pub use mysql::{MySqlDriver, MySqlSession};
pub use types::{BindKind, BoundValue, ParamValue, Parameters, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// What a non-row-returning execution reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Id generated by an AUTO_INCREMENT column, 0 if none.
    pub last_insert_id: u64,

    /// Rows changed by the statement.
    pub rows_affected: u64,
}

/// Opens connections. One call to `open` yields one session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Establishes a new connection using the given connection string.
    async fn open(&self, connection_string: &str) -> Result<Box<dyn Session>>;
}

/// A single open connection, scoped to one executor operation.
///
/// Statements use positional `?` markers; `binds` supplies them in order.
#[async_trait]
pub trait Session: Send {
    /// Executes a statement and reads every row.
    ///
    /// Returns `None` when the statement produced no result set at all, as
    /// opposed to a result set with no rows.
    async fn fetch_rows(&mut self, sql: &str, binds: &[BoundValue]) -> Result<Option<Vec<Row>>>;

    /// Executes a statement without reading rows.
    async fn execute(&mut self, sql: &str, binds: &[BoundValue]) -> Result<ExecOutcome>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}
