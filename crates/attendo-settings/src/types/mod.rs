//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a settings file may be partial; missing fields keep their defaults.

mod auth;
mod logging;
mod remote;

pub use auth::*;
pub use logging::*;
pub use remote::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "remote": { "url": "https://abc.supabase.co", "apiKey": "eyJ..." },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttendoSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Remote store connection.
    pub remote: RemoteSettings,
    /// Sign-in behaviour and token persistence.
    pub auth: AuthSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for AttendoSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "attendo".to_string(),
            remote: RemoteSettings::default(),
            auth: AuthSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
