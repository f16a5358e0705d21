//! Result envelope returned by every executor operation.
//!
//! An `ApiResult` pairs a coarse status code with exactly one payload kind.
//! The constructors are the only way to build one, which keeps status and
//! payload consistent. Deserialization checks the same pairing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::Row;
use crate::error::ExecutorError;

/// Coarse outcome classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    #[serde(rename = "OK")]
    Ok,
    NoContent,
    InvalidRequest,
    InternalServerError,
}

impl StatusCode {
    /// Returns true for the statuses that carry a result.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::NoContent)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::NoContent => "NoContent",
            Self::InvalidRequest => "InvalidRequest",
            Self::InternalServerError => "InternalServerError",
        };
        write!(f, "{name}")
    }
}

/// What an envelope carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Rows read by `fetch`, in server order.
    Rows(Vec<Row>),

    /// Inserted id or affected-row count.
    Scalar(i64),

    /// Why the operation did not succeed.
    Error(ExecutorError),
}

impl Payload {
    fn kind(&self) -> &'static str {
        match self {
            Self::Rows(rows) if rows.is_empty() => "empty rows",
            Self::Rows(_) => "rows",
            Self::Scalar(_) => "scalar",
            Self::Error(_) => "error",
        }
    }
}

/// Uniform success/failure/payload wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawApiResult")]
pub struct ApiResult {
    status: StatusCode,
    success: bool,
    payload: Payload,
}

/// Wire form of `ApiResult`, checked before it becomes one.
#[derive(Deserialize)]
struct RawApiResult {
    status: StatusCode,
    success: bool,
    payload: Payload,
}

impl TryFrom<RawApiResult> for ApiResult {
    type Error = String;

    fn try_from(raw: RawApiResult) -> Result<Self, Self::Error> {
        let matches_payload = match (&raw.payload, raw.status) {
            (Payload::Rows(rows), StatusCode::Ok) => !rows.is_empty(),
            (Payload::Rows(rows), StatusCode::NoContent) => rows.is_empty(),
            (Payload::Scalar(_), StatusCode::Ok) => true,
            (Payload::Error(ExecutorError::Validation(_)), StatusCode::InvalidRequest) => true,
            (Payload::Error(_), StatusCode::InternalServerError) => true,
            _ => false,
        };
        if !matches_payload {
            return Err(format!(
                "status {} does not match a {} payload",
                raw.status,
                raw.payload.kind()
            ));
        }
        if raw.success != raw.status.is_success() {
            return Err(format!(
                "success {} contradicts status {}",
                raw.success, raw.status
            ));
        }

        Ok(Self {
            status: raw.status,
            success: raw.success,
            payload: raw.payload,
        })
    }
}

impl ApiResult {
    /// `Ok` when any row came back, `NoContent` otherwise.
    pub fn rows(rows: Vec<Row>) -> Self {
        let status = if rows.is_empty() {
            StatusCode::NoContent
        } else {
            StatusCode::Ok
        };
        Self {
            status,
            success: true,
            payload: Payload::Rows(rows),
        }
    }

    /// `Ok` carrying an id or count.
    pub fn scalar(value: i64) -> Self {
        Self {
            status: StatusCode::Ok,
            success: true,
            payload: Payload::Scalar(value),
        }
    }

    /// Validation failure detected before any connection attempt.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::InvalidRequest,
            success: false,
            payload: Payload::Error(ExecutorError::validation(message)),
        }
    }

    /// Failure while connecting, executing or interpreting the outcome.
    pub fn internal_error(error: ExecutorError) -> Self {
        Self {
            status: StatusCode::InternalServerError,
            success: false,
            payload: Payload::Error(error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The rows, when this is a fetch result.
    pub fn row_data(&self) -> Option<&[Row]> {
        match &self.payload {
            Payload::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The id or count, when this is a write result.
    pub fn scalar_value(&self) -> Option<i64> {
        match self.payload {
            Payload::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ExecutorError> {
        match &self.payload {
            Payload::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::error::Result<ApiResult>> for ApiResult {
    fn from(result: crate::error::Result<ApiResult>) -> Self {
        result.unwrap_or_else(ApiResult::internal_error)
    }
}
