//! Fluent query builders over any [`RowStore`].
//!
//! ```text
//! store.table("event").select("*").eq("session_compo", id).execute::<Event>()
//! store.table("event").insert(&[row]).returning(mode).execute::<Event>()
//! ```

use attendo_core::InsertReturn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::StoreError;
use crate::traits::{EqFilter, InsertRequest, RowStore, SelectRequest};

impl dyn RowStore + '_ {
    /// Start a request against `name`.
    pub fn table(&self, name: &str) -> Table<'_> {
        Table {
            store: self,
            name: name.to_owned(),
        }
    }
}

/// A table handle, not yet bound to an operation.
pub struct Table<'a> {
    store: &'a dyn RowStore,
    name: String,
}

impl<'a> Table<'a> {
    /// Read `columns` (PostgREST projection syntax, `"*"` for all).
    pub fn select(self, columns: &str) -> SelectBuilder<'a> {
        SelectBuilder {
            store: self.store,
            request: SelectRequest {
                table: self.name,
                columns: columns.to_owned(),
                filters: Vec::new(),
            },
        }
    }

    /// Write `rows`. Encoding failures surface from `execute`.
    pub fn insert<T: Serialize>(self, rows: &[T]) -> InsertBuilder<'a> {
        let rows = rows.iter().map(serde_json::to_value).collect();
        InsertBuilder {
            store: self.store,
            table: self.name,
            rows,
            returning: InsertReturn::default(),
        }
    }
}

/// Pending select.
pub struct SelectBuilder<'a> {
    store: &'a dyn RowStore,
    request: SelectRequest,
}

impl SelectBuilder<'_> {
    /// Keep rows where `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.request.filters.push(EqFilter {
            column: column.to_owned(),
            value: value.to_string(),
        });
        self
    }

    /// The request as it will be sent.
    pub fn request(&self) -> &SelectRequest {
        &self.request
    }

    /// Run the select and decode every row as `T`.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        let rows = self.store.select_rows(self.request).await?;
        decode_rows(rows)
    }
}

/// Pending insert.
pub struct InsertBuilder<'a> {
    store: &'a dyn RowStore,
    table: String,
    rows: Result<Vec<Value>, serde_json::Error>,
    returning: InsertReturn,
}

impl InsertBuilder<'_> {
    /// Choose whether the store sends the written rows back.
    #[must_use]
    pub fn returning(mut self, returning: InsertReturn) -> Self {
        self.returning = returning;
        self
    }

    /// Run the insert and decode the acknowledged rows as `T`.
    ///
    /// With [`InsertReturn::Minimal`] the result is empty on success.
    pub async fn execute<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        let request = InsertRequest {
            table: self.table,
            rows: self.rows?,
            returning: self.returning,
        };
        let rows = self.store.insert_rows(request).await?;
        decode_rows(rows)
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::Decode))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
