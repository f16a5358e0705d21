//! One-shot query execution.
//!
//! Each operation validates its inputs, opens one session, runs the query
//! text (one statement or several separated by `;`), closes the session and
//! folds the outcome into an `ApiResult`.
//! Nothing escapes as an `Err`: failures become envelopes at this boundary.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::params::{prepare, PreparedStatement};
use crate::db::{Driver, ExecOutcome, MySqlDriver, Parameters, Row, Session};
use crate::error::{ExecutorError, Result};
use crate::response::ApiResult;

/// The operation being run, used to tag messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Insert,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Insert => "insert",
            Self::Update => "update",
        };
        write!(f, "{name}")
    }
}

/// Executes one query text over one short-lived connection.
pub struct QueryExecutor {
    connection_string: String,
    query: String,
    parameters: Option<Parameters>,
    driver: Arc<dyn Driver>,
}

impl QueryExecutor {
    /// Creates an executor without parameters.
    pub fn new(connection_string: impl Into<String>, query: impl Into<String>) -> Self {
        Self::with_parameters(connection_string, query, None)
    }

    /// Creates an executor with an optional parameter mapping.
    pub fn with_parameters(
        connection_string: impl Into<String>,
        query: impl Into<String>,
        parameters: Option<Parameters>,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            query: query.into(),
            parameters,
            driver: Arc::new(MySqlDriver),
        }
    }

    /// Replaces the driver sessions are opened through.
    pub fn with_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = driver;
        self
    }

    /// Runs a row-returning query.
    ///
    /// `Ok` with the rows when any came back, `NoContent` with an empty list
    /// otherwise.
    pub async fn fetch(&self) -> ApiResult {
        if let Some(invalid) = self.validate(Operation::Fetch, false) {
            return invalid;
        }
        self.finish(Operation::Fetch, self.run_fetch().await)
    }

    /// Runs a write and reports the generated id.
    ///
    /// An id of 0 means nothing was generated and is reported as an
    /// internal error.
    pub async fn insert(&self) -> ApiResult {
        if let Some(invalid) = self.validate(Operation::Insert, true) {
            return invalid;
        }
        self.finish(Operation::Insert, self.run_insert().await)
    }

    /// Runs a write through the row-reading path and reports the count found
    /// in the first column of the last row returned.
    ///
    /// The query is expected to return the count itself, e.g.
    /// `UPDATE ...; SELECT ROW_COUNT()` or a stored procedure ending in
    /// `SELECT ROW_COUNT()`. A count of 0 or no rows is reported as an
    /// internal error.
    pub async fn update(&self) -> ApiResult {
        if let Some(invalid) = self.validate(Operation::Update, true) {
            return invalid;
        }
        self.finish(Operation::Update, self.run_update().await)
    }

    fn validate(&self, operation: Operation, needs_parameters: bool) -> Option<ApiResult> {
        if self.connection_string.trim().is_empty() {
            return Some(ApiResult::invalid_request(format!(
                "Connection string is empty. Operation: {operation}"
            )));
        }
        if needs_parameters && self.parameters.is_none() {
            return Some(ApiResult::invalid_request(format!(
                "No parameters supplied to {operation} the record"
            )));
        }
        None
    }

    fn finish(&self, operation: Operation, result: Result<ApiResult>) -> ApiResult {
        if let Err(e) = &result {
            warn!("{} failed: {}", operation, e);
        }
        result.into()
    }

    async fn open(
        &self,
        operation: Operation,
    ) -> Result<(Box<dyn Session>, Vec<PreparedStatement>)> {
        let statements = prepare(&self.query, self.parameters.as_ref())?;
        debug!(
            "{}: opening session for {} statement(s) with {} bound values",
            operation,
            statements.len(),
            statements.iter().map(|s| s.binds.len()).sum::<usize>()
        );
        let session = self.driver.open(&self.connection_string).await?;
        Ok((session, statements))
    }

    async fn run_fetch(&self) -> Result<ApiResult> {
        let (mut session, statements) = self.open(Operation::Fetch).await?;
        let rows = first_result_set(session.as_mut(), &statements).await;
        close_session(session).await;

        Ok(ApiResult::rows(rows?))
    }

    async fn run_insert(&self) -> Result<ApiResult> {
        let (mut session, statements) = self.open(Operation::Insert).await?;
        let outcome = execute_all(session.as_mut(), &statements).await;
        close_session(session).await;

        let inserted_id = outcome?.last_insert_id;
        if inserted_id == 0 {
            return Err(ExecutorError::uncontrolled(
                "Uncontrolled error inserting the record",
            ));
        }
        let inserted_id = i64::try_from(inserted_id).map_err(|_| {
            ExecutorError::conversion(format!("Inserted id {inserted_id} is out of range"))
        })?;
        Ok(ApiResult::scalar(inserted_id))
    }

    async fn run_update(&self) -> Result<ApiResult> {
        let (mut session, statements) = self.open(Operation::Update).await?;
        let rows = first_result_set(session.as_mut(), &statements).await;
        close_session(session).await;

        let rows_affected = last_row_count(&rows?)?;
        if rows_affected <= 0 {
            return Err(ExecutorError::uncontrolled(
                "Uncontrolled error updating the record",
            ));
        }
        Ok(ApiResult::scalar(rows_affected))
    }
}

impl fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("connection_string", &"<redacted>")
            .field("query", &self.query)
            .field(
                "parameters",
                &self.parameters.as_ref().map(|p| p.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}

/// Releases a session. A failed close never replaces the operation's outcome.
async fn close_session(session: Box<dyn Session>) {
    match session.close().await {
        Ok(()) => debug!("Session closed"),
        Err(e) => warn!("Failed to close session: {}", e),
    }
}

/// Runs every statement in order and keeps the first result set produced.
///
/// Statements without a result set, such as the `UPDATE` in
/// `UPDATE ...; SELECT ROW_COUNT()`, are run for their effect only.
async fn first_result_set(
    session: &mut dyn Session,
    statements: &[PreparedStatement],
) -> Result<Vec<Row>> {
    let mut result_set = None;
    for statement in statements {
        let rows = session.fetch_rows(&statement.sql, &statement.binds).await?;
        if result_set.is_none() {
            result_set = rows;
        }
    }
    Ok(result_set.unwrap_or_default())
}

/// Runs every statement in order. The last non-zero insert id wins and
/// affected rows add up.
async fn execute_all(
    session: &mut dyn Session,
    statements: &[PreparedStatement],
) -> Result<ExecOutcome> {
    let mut total = ExecOutcome::default();
    for statement in statements {
        let outcome = session.execute(&statement.sql, &statement.binds).await?;
        if outcome.last_insert_id != 0 {
            total.last_insert_id = outcome.last_insert_id;
        }
        total.rows_affected += outcome.rows_affected;
    }
    Ok(total)
}

/// Reads the first column of every row as a count and keeps the last one.
fn last_row_count(rows: &[Row]) -> Result<i64> {
    let mut count = 0;
    for row in rows {
        let first = row
            .first()
            .ok_or_else(|| ExecutorError::conversion("Returned row has no columns"))?;
        count = first.to_i64()?;
    }
    Ok(count)
}
