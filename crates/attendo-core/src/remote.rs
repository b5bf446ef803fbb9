//! Connection vocabulary shared by the data and auth halves of the remote
//! store client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Header carrying the project's public API key on every request.
pub const API_KEY_HEADER: &str = "apikey";

/// Base URL and public key of a hosted project.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    url: String,
    api_key: String,
}

impl RemoteEndpoint {
    /// Create an endpoint. A trailing `/` on `url` is dropped.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Project base URL without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Public (anon) API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `{url}/rest/v1/{table}`.
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    /// `{url}/auth/v1/{path}`.
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteEndpoint")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Browser-style authentication handshake used by the auth client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Authorization code with proof-key exchange.
    #[default]
    Pkce,
    /// Tokens returned directly in the redirect fragment.
    Implicit,
}

/// What an insert asks the store to send back.
///
/// With [`InsertReturn::Minimal`] the store acknowledges the write without a
/// body and the insert yields no rows even on success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertReturn {
    /// `Prefer: return=minimal`.
    Minimal,
    /// `Prefer: return=representation`.
    #[default]
    Representation,
}

impl InsertReturn {
    /// Value of the `Prefer` request header.
    pub fn prefer_header(self) -> &'static str {
        match self {
            Self::Minimal => "return=minimal",
            Self::Representation => "return=representation",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
