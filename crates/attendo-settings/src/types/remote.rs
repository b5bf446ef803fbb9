//! Remote store connection settings.

use attendo_core::{FlowType, InsertReturn, RemoteEndpoint};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Where the hosted backend lives and how to talk to it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Public (anon) API key.
    pub api_key: String,
    /// Auth handshake. Browser-style clients use PKCE.
    pub flow_type: FlowType,
    /// Per-request timeout. `None` leaves it to the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
    /// Whether inserts ask for the written rows back.
    pub insert_return: InsertReturn,
}

impl RemoteSettings {
    /// Endpoint built from `url` and `api_key`.
    pub fn endpoint(&self) -> Result<RemoteEndpoint> {
        if self.url.is_empty() {
            return Err(SettingsError::Missing("remote.url"));
        }
        if self.api_key.is_empty() {
            return Err(SettingsError::Missing("remote.apiKey"));
        }
        Ok(RemoteEndpoint::new(&self.url, &self.api_key))
    }

    /// Request timeout as a [`std::time::Duration`].
    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout_ms.map(std::time::Duration::from_millis)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
