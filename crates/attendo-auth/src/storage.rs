//! Auth session file I/O.
//!
//! Reads and writes `~/.attendo/auth.json` with secure file permissions
//! (0o600). The file holds the current session and, between `login` and
//! the code exchange, the pending PKCE verifier.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AuthError;
use crate::types::AuthSession;

/// Schema version written by this crate.
pub const STORAGE_VERSION: u32 = 1;

/// On-disk auth state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStorage {
    /// Schema version.
    pub version: u32,
    /// Current session, if signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<AuthSession>,
    /// PKCE verifier awaiting its authorization code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
    /// RFC 3339 time of the last write.
    #[serde(default)]
    pub last_updated: String,
}

impl Default for AuthStorage {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION,
            session: None,
            code_verifier: None,
            last_updated: String::new(),
        }
    }
}

/// Load auth storage from file (sync).
///
/// Returns `None` if the file doesn't exist or is invalid.
pub fn load_auth_storage(path: &Path) -> Option<AuthStorage> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("failed to read auth file: {e}");
            return None;
        }
    };

    match serde_json::from_str::<AuthStorage>(&data) {
        Ok(storage) if storage.version == STORAGE_VERSION => Some(storage),
        Ok(storage) => {
            tracing::warn!("unsupported auth storage version: {}", storage.version);
            None
        }
        Err(e) => {
            tracing::warn!("failed to parse auth file: {e}");
            None
        }
    }
}

/// Save auth storage to file (sync).
///
/// Creates parent directories if needed. Sets file permissions to 0o600.
pub fn save_auth_storage(path: &Path, storage: &mut AuthStorage) -> Result<(), AuthError> {
    storage.last_updated = chrono::Utc::now().to_rfc3339();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(storage)?;
    std::fs::write(path, &json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }

    Ok(())
}

/// Replace the stored session, keeping any pending verifier.
pub fn save_session(path: &Path, session: Option<&AuthSession>) -> Result<(), AuthError> {
    let mut storage = load_auth_storage(path).unwrap_or_default();
    storage.session = session.cloned();
    save_auth_storage(path, &mut storage)
}

/// Replace the stored PKCE verifier, keeping any session.
pub fn save_code_verifier(path: &Path, verifier: Option<&str>) -> Result<(), AuthError> {
    let mut storage = load_auth_storage(path).unwrap_or_default();
    storage.code_verifier = verifier.map(str::to_string);
    save_auth_storage(path, &mut storage)
}

/// Delete the entire auth file.
pub fn clear_all_auth(path: &Path) -> Result<(), AuthError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AuthError::Io(e)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
