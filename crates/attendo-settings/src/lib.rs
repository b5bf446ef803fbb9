//! # attendo-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AttendoSettings::default()`]
//! 2. **User file**: `~/.attendo/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ATTENDO_*` and the `VITE_SUPABASE_*` pair
//!    (highest priority)
//!
//! The remote endpoint and API key have no compiled default. Their absence is
//! only reported when a client is built from them, see
//! [`RemoteSettings::endpoint`].

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Process-wide settings, loaded on first access.
static SETTINGS: OnceLock<AttendoSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads `~/.attendo/settings.json` with env var overrides.
/// If loading fails, returns compiled defaults with env overrides applied.
pub fn get_settings() -> &'static AttendoSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!("failed to load settings, using defaults: {e}");
            let mut settings = AttendoSettings::default();
            loader::apply_env_overrides(&mut settings);
            settings
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns `Err(settings)` if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: AttendoSettings) -> std::result::Result<(), AttendoSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
