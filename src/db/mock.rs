//! Mock database driver for testing.
//!
//! Returns scripted results and keeps count of opened and closed sessions
//! so tests can check that every connection is released.

use super::{BoundValue, Driver, ExecOutcome, Row, Session};
use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the mock driver answers with.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    /// Rows returned by every row-returning statement.
    pub rows: Vec<Row>,

    /// Per-statement result sets within a session, in order. When empty,
    /// every statement yields `rows`; past the end, statements yield none.
    pub result_sets: Vec<Option<Vec<Row>>>,

    /// Reported by every non-row-returning statement.
    pub outcome: ExecOutcome,

    /// When set, `open` fails with this error.
    pub open_error: Option<ExecutorError>,

    /// When set, every statement fails with this error.
    pub statement_error: Option<ExecutorError>,
}

/// A statement a mock session was asked to run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub binds: Vec<BoundValue>,
}

#[derive(Debug, Default)]
struct MockState {
    script: MockScript,
    opened: AtomicUsize,
    closed: AtomicUsize,
    statements: Mutex<Vec<RecordedStatement>>,
}

impl MockState {
    fn record(&self, sql: &str, binds: &[BoundValue]) {
        if let Ok(mut statements) = self.statements.lock() {
            statements.push(RecordedStatement {
                sql: sql.to_string(),
                binds: binds.to_vec(),
            });
        }
    }
}

/// A mock driver that hands out scripted sessions.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    /// Creates a mock driver from a full script.
    pub fn new(script: MockScript) -> Self {
        Self {
            state: Arc::new(MockState {
                script,
                ..Default::default()
            }),
        }
    }

    /// Every row-returning statement yields `rows`.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self::new(MockScript {
            rows,
            ..Default::default()
        })
    }

    /// The n-th statement of each session yields `result_sets[n]`.
    pub fn with_result_sets(result_sets: Vec<Option<Vec<Row>>>) -> Self {
        Self::new(MockScript {
            result_sets,
            ..Default::default()
        })
    }

    /// Every write reports `last_insert_id` and one affected row.
    pub fn with_insert_id(last_insert_id: u64) -> Self {
        Self::new(MockScript {
            outcome: ExecOutcome {
                last_insert_id,
                rows_affected: 1,
            },
            ..Default::default()
        })
    }

    /// Connecting fails.
    pub fn failing_open(error: ExecutorError) -> Self {
        Self::new(MockScript {
            open_error: Some(error),
            ..Default::default()
        })
    }

    /// Connecting succeeds but every statement fails.
    pub fn failing_statements(error: ExecutorError) -> Self {
        Self::new(MockScript {
            statement_error: Some(error),
            ..Default::default()
        })
    }

    /// Number of sessions successfully opened.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of sessions closed.
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Statements run so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state
            .statements
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, _connection_string: &str) -> Result<Box<dyn Session>> {
        if let Some(err) = &self.state.script.open_error {
            return Err(err.clone());
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            statements_run: 0,
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
    statements_run: usize,
}

#[async_trait]
impl Session for MockSession {
    async fn fetch_rows(&mut self, sql: &str, binds: &[BoundValue]) -> Result<Option<Vec<Row>>> {
        self.state.record(sql, binds);
        if let Some(err) = &self.state.script.statement_error {
            return Err(err.clone());
        }

        let script = &self.state.script;
        let index = self.statements_run;
        self.statements_run += 1;
        if script.result_sets.is_empty() {
            Ok(Some(script.rows.clone()))
        } else {
            Ok(script.result_sets.get(index).cloned().flatten())
        }
    }

    async fn execute(&mut self, sql: &str, binds: &[BoundValue]) -> Result<ExecOutcome> {
        self.state.record(sql, binds);
        match &self.state.script.statement_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.state.script.outcome),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
