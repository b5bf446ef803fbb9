//! In-memory [`RowStore`] for exercising data-access code without HTTP.

use std::collections::HashMap;

use async_trait::async_trait;
use attendo_core::{InsertReturn, RemoteQueryError};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::traits::{EqFilter, InsertRequest, RowStore, SelectRequest};

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Value>>,
    failures: HashMap<String, RemoteQueryError>,
    selects: Vec<SelectRequest>,
    inserts: Vec<InsertRequest>,
    next_id: u64,
}

/// Tables held as JSON rows; ids are assigned on insert.
#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.inner
            .lock()
            .tables
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
    }

    /// Every request against `table` fails with `err` from now on.
    pub(crate) fn fail_table(&self, table: &str, err: RemoteQueryError) {
        let _ = self.inner.lock().failures.insert(table.to_owned(), err);
    }

    pub(crate) fn rows(&self, table: &str) -> Vec<Value> {
        self.inner.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub(crate) fn last_select(&self) -> Option<SelectRequest> {
        self.inner.lock().selects.last().cloned()
    }

    pub(crate) fn last_insert(&self) -> Option<InsertRequest> {
        self.inner.lock().inserts.last().cloned()
    }
}

fn matches(row: &Value, filter: &EqFilter) -> bool {
    match row.get(&filter.column) {
        Some(Value::String(s)) => *s == filter.value,
        Some(other) => other.to_string() == filter.value,
        None => false,
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select_rows(&self, request: SelectRequest) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.inner.lock();
        inner.selects.push(request.clone());
        if let Some(err) = inner.failures.get(&request.table) {
            return Err(StoreError::Remote(err.clone()));
        }
        let rows = inner.tables.get(&request.table).map_or_else(Vec::new, |rows| {
            rows.iter()
                .filter(|row| request.filters.iter().all(|f| matches(row, f)))
                .cloned()
                .collect()
        });
        Ok(rows)
    }

    async fn insert_rows(&self, request: InsertRequest) -> Result<Vec<Value>, StoreError> {
        let mut inner = self.inner.lock();
        inner.inserts.push(request.clone());
        if let Some(err) = inner.failures.get(&request.table) {
            return Err(StoreError::Remote(err.clone()));
        }
        let mut written = Vec::with_capacity(request.rows.len());
        for row in request.rows {
            let mut obj = match row {
                Value::Object(obj) => obj,
                _ => Map::new(),
            };
            if !obj.contains_key("id") {
                inner.next_id += 1;
                let _ = obj.insert("id".into(), Value::from(inner.next_id));
            }
            written.push(Value::Object(obj));
        }
        inner
            .tables
            .entry(request.table)
            .or_default()
            .extend(written.iter().cloned());
        match request.returning {
            InsertReturn::Representation => Ok(written),
            InsertReturn::Minimal => Ok(Vec::new()),
        }
    }
}
