//! Error taxonomy for the remote store boundary.
//!
//! [`RemoteQueryError`] is the only error the data-access layer hands to its
//! callers. It wraps whatever diagnostic the remote store attached to a
//! failed select or insert (PostgREST `code`, `message`, `details`, `hint`)
//! together with the table and operation that failed. Transport failures,
//! where the store never answered, are folded into the same type with
//! [`TRANSPORT_ERROR_CODE`]. Rows the store accepted but this client could
//! not read back carry [`DECODE_ERROR_CODE`] and the original status.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `code` used when the request never produced a store diagnostic.
pub const TRANSPORT_ERROR_CODE: &str = "transport";

/// `code` used when the store answered 2xx with rows that could not be read.
pub const DECODE_ERROR_CODE: &str = "decode";

/// Kind of round trip against a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperation {
    /// `GET /rest/v1/{table}`.
    Select,
    /// `POST /rest/v1/{table}`.
    Insert,
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::Insert => write!(f, "insert"),
        }
    }
}

/// Diagnostic body PostgREST returns alongside a non-2xx status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDiagnostic {
    /// Postgres SQLSTATE or PostgREST `PGRST*` code.
    #[serde(default)]
    pub code: Option<String>,
    /// Primary message.
    #[serde(default)]
    pub message: Option<String>,
    /// Extra detail.
    #[serde(default)]
    pub details: Option<String>,
    /// Suggested fix.
    #[serde(default)]
    pub hint: Option<String>,
}

/// A select or insert the remote store refused, or that never reached it.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{operation} on {table} failed ({status}): {message}")]
pub struct RemoteQueryError {
    /// Table the request targeted.
    pub table: String,
    /// Operation that failed.
    pub operation: QueryOperation,
    /// HTTP status, `0` when no response arrived.
    pub status: u16,
    /// Machine-readable code from the store, or [`TRANSPORT_ERROR_CODE`].
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Extra detail from the store.
    pub details: Option<String>,
    /// Hint from the store.
    pub hint: Option<String>,
}

impl RemoteQueryError {
    /// Build from a store diagnostic body.
    #[must_use]
    pub fn from_diagnostic(
        table: impl Into<String>,
        operation: QueryOperation,
        status: u16,
        diagnostic: RemoteDiagnostic,
    ) -> Self {
        Self {
            table: table.into(),
            operation,
            status,
            code: diagnostic
                .code
                .unwrap_or_else(|| format!("HTTP_{status}")),
            message: diagnostic
                .message
                .unwrap_or_else(|| "remote store returned an error".to_string()),
            details: diagnostic.details,
            hint: diagnostic.hint,
        }
    }

    /// Build for a request that produced no store diagnostic.
    #[must_use]
    pub fn transport(
        table: impl Into<String>,
        operation: QueryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            operation,
            status: 0,
            code: TRANSPORT_ERROR_CODE.to_string(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    /// Build for a successful response whose rows could not be read.
    ///
    /// The write, if any, has already happened.
    #[must_use]
    pub fn decode(
        table: impl Into<String>,
        operation: QueryOperation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: DECODE_ERROR_CODE.to_string(),
            ..Self::transport(table, operation, message)
        }
    }

    /// Whether the store itself produced this error.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.code != TRANSPORT_ERROR_CODE && self.code != DECODE_ERROR_CODE
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
