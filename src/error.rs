//! Error types for myexec.
//!
//! Defines the error enum carried inside failed result envelopes and used
//! by every fallible step below the executor boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for myexec operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "message", rename_all = "snake_case")]
pub enum ExecutorError {
    /// Input rejected before any connection attempt (blank connection string, missing parameters).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, unbound placeholders, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// A returned column could not be interpreted as the expected type.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// A write completed without producing an id or affecting any row.
    #[error("Uncontrolled error: {0}")]
    Uncontrolled(String),

    /// Configuration errors (invalid config file, malformed connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExecutorError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a conversion error with the given message.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Creates an uncontrolled-outcome error with the given message.
    pub fn uncontrolled(msg: impl Into<String>) -> Self {
        Self::Uncontrolled(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid Request",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Conversion(_) => "Conversion Error",
            Self::Uncontrolled(_) => "Uncontrolled Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::Connection(m)
            | Self::Query(m)
            | Self::Conversion(m)
            | Self::Uncontrolled(m)
            | Self::Config(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result type alias using ExecutorError.
pub type Result<T> = std::result::Result<T, ExecutorError>;
