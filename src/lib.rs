//! myexec - one-shot MySQL query execution with uniform result envelopes.
//!
//! Each `QueryExecutor` call opens a connection, runs one statement, closes
//! the connection and answers with an `ApiResult`.

pub mod config;
pub mod db;
pub mod error;
pub mod query;
pub mod response;

pub use db::{ParamValue, Parameters, Value};
pub use error::{ExecutorError, Result};
pub use query::QueryExecutor;
pub use response::{ApiResult, Payload, StatusCode};
