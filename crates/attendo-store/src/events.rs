//! Exam events ("épreuves") attached to a teaching unit of a session.

use attendo_core::{
    EVENT_TABLE, Event, InsertReturn, NewEvent, QueryOperation, RemoteQueryError,
    SessionComponentId,
};

use crate::errors::report;
use crate::traits::RowStore;

/// Column linking an event to its session component.
pub const SESSION_COMPO_COLUMN: &str = "session_compo";

/// Events whose `session_compo` equals `session_compo_id`.
///
/// The id is forwarded as-is; a malformed one is the store's to reject.
#[tracing::instrument(skip(store))]
pub async fn fetch_events(
    store: &dyn RowStore,
    session_compo_id: &SessionComponentId,
) -> Result<Vec<Event>, RemoteQueryError> {
    store
        .table(EVENT_TABLE)
        .select("*")
        .eq(SESSION_COMPO_COLUMN, session_compo_id)
        .execute()
        .await
        .map_err(|e| report("Error fetching events", EVENT_TABLE, QueryOperation::Select, e))
}

/// Create one not-yet-completed event labelled `label` under
/// `session_compo_id`.
#[tracing::instrument(skip(store))]
pub async fn add_event(
    store: &dyn RowStore,
    session_compo_id: &SessionComponentId,
    label: &str,
    returning: InsertReturn,
) -> Result<Vec<Event>, RemoteQueryError> {
    let row = NewEvent::new(session_compo_id.clone(), label);
    store
        .table(EVENT_TABLE)
        .insert(&[row])
        .returning(returning)
        .execute()
        .await
        .map_err(|e| report("Error adding event", EVENT_TABLE, QueryOperation::Insert, e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
