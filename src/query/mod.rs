//! Query execution for myexec.
//!
//! Placeholder rewriting and the one-shot executor built on top of the
//! `db` driver seam.

pub mod executor;
pub mod params;

pub use executor::{Operation, QueryExecutor};
pub use params::{prepare, PreparedStatement};
