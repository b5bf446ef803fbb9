//! Data half of the remote store client.
//!
//! [`RestClient`] speaks the PostgREST dialect served at `{url}/rest/v1`.
//! Every request carries the public API key; the bearer is the signed-in
//! user's access token when a [`TokenSource`] provides one, the API key
//! otherwise.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attendo_core::remote::API_KEY_HEADER;
use attendo_core::{
    InsertReturn, QueryOperation, RemoteDiagnostic, RemoteEndpoint, RemoteQueryError,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;

use crate::errors::StoreError;
use crate::query::Table;
use crate::traits::{InsertRequest, RowStore, SelectRequest, TokenSource};

/// Client for the hosted data API.
pub struct RestClient {
    endpoint: RemoteEndpoint,
    http: reqwest::Client,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl RestClient {
    /// Build a client that authenticates with the API key alone.
    pub fn new(
        endpoint: RemoteEndpoint,
        request_timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint,
            http: builder.build()?,
            tokens: None,
        })
    }

    /// Send the user's access token as bearer whenever one is available.
    #[must_use]
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    /// Start a request against `name`.
    pub fn table(&self, name: &str) -> Table<'_> {
        (self as &dyn RowStore).table(name)
    }

    async fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = match &self.tokens {
            Some(tokens) => tokens.access_token().await,
            None => None,
        };
        let bearer = token.unwrap_or_else(|| self.endpoint.api_key().to_string());
        req.header(API_KEY_HEADER, self.endpoint.api_key())
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl RowStore for RestClient {
    #[tracing::instrument(skip_all, fields(table = %request.table))]
    async fn select_rows(&self, request: SelectRequest) -> Result<Vec<Value>, StoreError> {
        let mut query = vec![("select".to_string(), request.columns.clone())];
        query.extend(
            request
                .filters
                .iter()
                .map(|f| (f.column.clone(), format!("eq.{}", f.value))),
        );

        let resp = self
            .authorize(self.http.get(self.endpoint.rest_url(&request.table)))
            .await
            .query(&query)
            .send()
            .await?;
        if !resp.status().is_success() {
            let err = remote_error(resp, &request.table, QueryOperation::Select).await;
            return Err(err.into());
        }
        Ok(resp.json().await?)
    }

    #[tracing::instrument(skip_all, fields(table = %request.table, rows = request.rows.len()))]
    async fn insert_rows(&self, request: InsertRequest) -> Result<Vec<Value>, StoreError> {
        let resp = self
            .authorize(self.http.post(self.endpoint.rest_url(&request.table)))
            .await
            .header("Prefer", request.returning.prefer_header())
            .json(&request.rows)
            .send()
            .await?;
        if !resp.status().is_success() {
            let err = remote_error(resp, &request.table, QueryOperation::Insert).await;
            return Err(err.into());
        }
        if request.returning == InsertReturn::Minimal {
            return Ok(Vec::new());
        }
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

async fn remote_error(
    resp: reqwest::Response,
    table: &str,
    operation: QueryOperation,
) -> RemoteQueryError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let diagnostic =
        serde_json::from_str::<RemoteDiagnostic>(&text).unwrap_or_else(|_| RemoteDiagnostic {
            message: (!text.is_empty()).then_some(text),
            ..RemoteDiagnostic::default()
        });
    RemoteQueryError::from_diagnostic(table, operation, status, diagnostic)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
