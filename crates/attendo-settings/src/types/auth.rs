//! Sign-in settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sign-in defaults and where the auth session is persisted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// OAuth provider used by `login` when none is given (e.g. `azure`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// URL the provider redirects back to with the authorization code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    /// Auth session file. Defaults to `~/.attendo/auth.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl AuthSettings {
    /// Resolved auth session file path.
    pub fn storage_path(&self) -> PathBuf {
        self.storage_path.as_ref().map_or_else(
            || crate::loader::data_dir().join("auth.json"),
            PathBuf::from,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
