//! # attendo-store
//!
//! Data access for the attendance gateway.
//!
//! [`RestClient`] talks to the hosted table store. The session and event
//! functions are written against the [`RowStore`] trait and turn every
//! failure into a logged [`attendo_core::RemoteQueryError`]:
//!
//! - [`fetch_sessions`] / [`add_session`]
//! - [`fetch_events`] / [`add_event`]

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod query;
pub mod rest;
pub mod sessions;
#[cfg(test)]
mod testing;
pub mod traits;

pub use errors::StoreError;
pub use events::{add_event, fetch_events};
pub use query::{InsertBuilder, SelectBuilder, Table};
pub use rest::RestClient;
pub use sessions::{add_session, fetch_sessions};
pub use traits::{EqFilter, InsertRequest, RowStore, SelectRequest, TokenSource};
