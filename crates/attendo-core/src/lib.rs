//! # attendo-core
//!
//! Foundation types shared by every Attendo crate:
//!
//! - **Branded IDs**: `SessionId`, `SessionComponentId`, `EventId`, `RoomId`, `UserId`
//! - **Records**: `Session`, `Event` and `Identity` rows as the remote store returns them
//! - **Remote**: endpoint, auth flow and insert-return vocabulary
//! - **Errors**: [`RemoteQueryError`], the pass-through wrapper for remote store failures
//! - **Logging**: `tracing` subscriber setup and an in-memory capture helper for tests

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod logging;
pub mod records;
pub mod remote;

pub use errors::{
    DECODE_ERROR_CODE, QueryOperation, RemoteDiagnostic, RemoteQueryError, TRANSPORT_ERROR_CODE,
};
pub use ids::{EventId, RoomId, SessionComponentId, SessionId, UserId};
pub use records::{EVENT_TABLE, Event, Identity, NewEvent, NewSession, SESSION_TABLE, Session};
pub use remote::{FlowType, InsertReturn, RemoteEndpoint};
