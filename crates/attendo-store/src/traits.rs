//! The seam between query building and query execution.
//!
//! [`RowStore`] is implemented by [`crate::rest::RestClient`] against the
//! hosted data API. Data-access functions only ever see `&dyn RowStore`.

use async_trait::async_trait;
use attendo_core::InsertReturn;
use serde_json::Value;

use crate::errors::StoreError;

/// Single equality predicate, `column = value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqFilter {
    /// Column name.
    pub column: String,
    /// Value as the store's query string expects it.
    pub value: String,
}

/// A read of one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectRequest {
    /// Table name.
    pub table: String,
    /// Column projection, e.g. `"*"`.
    pub columns: String,
    /// Predicates, all of which must hold.
    pub filters: Vec<EqFilter>,
}

/// A write of one or more rows into one table.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertRequest {
    /// Table name.
    pub table: String,
    /// Rows to write, as JSON objects.
    pub rows: Vec<Value>,
    /// Whether the written rows are sent back.
    pub returning: InsertReturn,
}

/// Executes requests against a table store.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Run a select and return the raw rows.
    async fn select_rows(&self, request: SelectRequest) -> Result<Vec<Value>, StoreError>;

    /// Run an insert and return whatever rows the store acknowledged.
    async fn insert_rows(&self, request: InsertRequest) -> Result<Vec<Value>, StoreError>;
}

/// Provides the bearer token for data requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Access token of the signed-in user, if any, valid for the next
    /// request.
    async fn access_token(&self) -> Option<String>;
}

#[async_trait]
impl TokenSource for attendo_auth::AuthClient {
    async fn access_token(&self) -> Option<String> {
        match self.valid_access_token().await {
            Ok(token) => token,
            Err(e) => {
                // a rejected refresh has already signed out; anything else
                // leaves the current token to be tried as-is
                tracing::warn!("could not refresh access token: {e}");
                attendo_auth::AuthClient::access_token(self)
            }
        }
    }
}
