//! Exam sessions.

use attendo_core::{
    InsertReturn, NewSession, QueryOperation, RemoteQueryError, SESSION_TABLE, Session,
};

use crate::errors::report;
use crate::traits::RowStore;

/// All sessions visible to the caller.
#[tracing::instrument(skip_all)]
pub async fn fetch_sessions(store: &dyn RowStore) -> Result<Vec<Session>, RemoteQueryError> {
    store
        .table(SESSION_TABLE)
        .select("*")
        .execute()
        .await
        .map_err(|e| {
            report("Error fetching sessions", SESSION_TABLE, QueryOperation::Select, e)
        })
}

/// Create one session labelled `label`.
///
/// The returned rows are whatever the store acknowledged, which is empty
/// for [`InsertReturn::Minimal`].
#[tracing::instrument(skip(store))]
pub async fn add_session(
    store: &dyn RowStore,
    label: &str,
    returning: InsertReturn,
) -> Result<Vec<Session>, RemoteQueryError> {
    store
        .table(SESSION_TABLE)
        .insert(&[NewSession::new(label)])
        .returning(returning)
        .execute()
        .await
        .map_err(|e| report("Error adding session", SESSION_TABLE, QueryOperation::Insert, e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
