//! Value types exchanged with the database.
//!
//! `Value` is what comes back in a result row; `ParamValue` is what callers
//! bind into a query. Binding goes through a small closed mapping from the
//! parameter's variant to a driver bind kind.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ExecutorError, Result};

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Named query parameters. Keys may carry a leading `@`.
pub type Parameters = HashMap<String, ParamValue>;

/// Represents a single value read from a MySQL result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Unsigned integer that does not fit in i64 semantics (BIGINT UNSIGNED).
    UInt(u64),

    /// Floating point number.
    Float(f64),

    /// Text value. DECIMAL and other textual types land here too.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// DATETIME / TIMESTAMP.
    Timestamp(NaiveDateTime),

    /// DATE.
    Date(NaiveDate),

    /// TIME.
    Time(NaiveTime),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to convert the value to a string representation.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::UInt(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S").to_string(),
        }
    }

    /// Interprets the value as an integer count.
    ///
    /// Numeric values, booleans and numeric text convert; floats round to
    /// the nearest integer, ties to even. NULL, binary and temporal values do not.
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::UInt(u) => i64::try_from(*u)
                .map_err(|_| ExecutorError::conversion(format!("{u} is out of range for i64"))),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                Ok(f.round_ties_even() as i64)
            }
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                ExecutorError::conversion(format!("'{s}' is not a valid integer"))
            }),
            other => Err(ExecutorError::conversion(format!(
                "{} cannot be converted to an integer",
                other.to_display_string()
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Driver-level type a parameter is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Integer,
    VarChar,
    DateTime,
    Null,
}

/// A value supplied by the caller for a named placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Int(i64),
    String(String),
    Timestamp(NaiveDateTime),
    Null,
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl ParamValue {
    /// Selects the bind kind from the value's variant. Variants outside the
    /// closed set fall back to `VarChar`.
    pub fn bind_kind(&self) -> BindKind {
        match self {
            ParamValue::Int(_) => BindKind::Integer,
            ParamValue::String(_) => BindKind::VarChar,
            ParamValue::Timestamp(_) => BindKind::DateTime,
            ParamValue::Null => BindKind::Null,
            _ => BindKind::VarChar,
        }
    }

    /// Produces the value actually sent to the driver.
    pub fn to_bound(&self) -> BoundValue {
        match self {
            ParamValue::Int(i) => BoundValue::Integer(*i),
            ParamValue::String(s) => BoundValue::VarChar(s.clone()),
            ParamValue::Timestamp(ts) => BoundValue::DateTime(*ts),
            ParamValue::Null => BoundValue::Null,
            ParamValue::Float(f) => BoundValue::VarChar(f.to_string()),
            ParamValue::Bool(b) => BoundValue::VarChar(b.to_string()),
            ParamValue::Date(d) => BoundValue::VarChar(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A parameter after bind-kind inference, ready for the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Integer(i64),
    VarChar(String),
    DateTime(NaiveDateTime),
    Null,
}

impl BoundValue {
    pub fn kind(&self) -> BindKind {
        match self {
            BoundValue::Integer(_) => BindKind::Integer,
            BoundValue::VarChar(_) => BindKind::VarChar,
            BoundValue::DateTime(_) => BindKind::DateTime,
            BoundValue::Null => BindKind::Null,
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        ParamValue::Timestamp(v)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(v: NaiveDate) -> Self {
        ParamValue::Date(v)
    }
}

impl<T> From<Option<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => ParamValue::Null,
        }
    }
}
