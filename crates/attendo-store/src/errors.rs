//! Data client error types.

use attendo_core::{QueryOperation, RemoteQueryError};

/// Errors produced while talking to the data API.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store answered 2xx with a row this client cannot read.
    #[error("malformed row: {0}")]
    Decode(#[source] serde_json::Error),

    /// The store answered with a diagnostic.
    #[error(transparent)]
    Remote(#[from] RemoteQueryError),
}

impl StoreError {
    /// Normalize into the single error kind callers see.
    pub fn into_remote(self, table: &str, operation: QueryOperation) -> RemoteQueryError {
        match self {
            Self::Remote(e) => e,
            Self::Http(e) => RemoteQueryError::transport(table, operation, e.to_string()),
            Self::Json(e) => RemoteQueryError::transport(table, operation, e.to_string()),
            Self::Decode(e) => {
                RemoteQueryError::decode(table, operation, format!("malformed row: {e}"))
            }
        }
    }
}

/// Log a failed data-access call at error level and hand back the
/// normalized error.
pub(crate) fn report(
    context: &'static str,
    table: &str,
    operation: QueryOperation,
    err: StoreError,
) -> RemoteQueryError {
    let err = err.into_remote(table, operation);
    tracing::error!(
        table = %err.table,
        operation = %err.operation,
        status = err.status,
        code = %err.code,
        reason = %err.message,
        details = err.details.as_deref().unwrap_or_default(),
        hint = err.hint.as_deref().unwrap_or_default(),
        "{context}"
    );
    err
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
