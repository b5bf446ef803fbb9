//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`AttendoSettings::default()`]
//! 2. If `~/.attendo/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::AttendoSettings;

/// Project URL. Takes precedence over [`VITE_URL_ENV`].
pub const URL_ENV: &str = "ATTENDO_SUPABASE_URL";
/// Public API key. Takes precedence over [`VITE_KEY_ENV`].
pub const KEY_ENV: &str = "ATTENDO_SUPABASE_KEY";
/// Project URL as the web front-end's build env names it.
pub const VITE_URL_ENV: &str = "VITE_SUPABASE_URL";
/// Public API key as the web front-end's build env names it.
pub const VITE_KEY_ENV: &str = "VITE_SUPABASE_KEY";

/// `~/.attendo`.
pub fn data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".attendo")
}

/// Resolve the path to the settings file (`~/.attendo/settings.json`).
pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<AttendoSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<AttendoSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<AttendoSettings> {
    let defaults = serde_json::to_value(AttendoSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut AttendoSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty values count as unset. Invalid numbers and enum names are logged
/// and ignored, keeping the file/default value.
pub fn apply_overrides_from(
    settings: &mut AttendoSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Remote ──────────────────────────────────────────────────────
    if let Some(v) = read(URL_ENV).or_else(|| read(VITE_URL_ENV)) {
        settings.remote.url = v;
    }
    if let Some(v) = read(KEY_ENV).or_else(|| read(VITE_KEY_ENV)) {
        settings.remote.api_key = v;
    }
    if let Some(v) = read("ATTENDO_REQUEST_TIMEOUT_MS") {
        match parse_u64_range(&v, 1, 600_000) {
            Some(ms) => settings.remote.request_timeout_ms = Some(ms),
            None => tracing::warn!(
                key = "ATTENDO_REQUEST_TIMEOUT_MS",
                value = %v,
                "invalid u64 env var, ignoring"
            ),
        }
    }
    if let Some(v) = read("ATTENDO_INSERT_RETURN") {
        match serde_json::from_value(Value::String(v.to_lowercase())) {
            Ok(mode) => settings.remote.insert_return = mode,
            Err(_) => tracing::warn!(
                key = "ATTENDO_INSERT_RETURN",
                value = %v,
                "invalid insert return mode, ignoring"
            ),
        }
    }

    // ── Auth ────────────────────────────────────────────────────────
    if let Some(v) = read("ATTENDO_AUTH_PROVIDER") {
        settings.auth.provider = Some(v);
    }
    if let Some(v) = read("ATTENDO_REDIRECT_TO") {
        settings.auth.redirect_to = Some(v);
    }
    if let Some(v) = read("ATTENDO_AUTH_FILE") {
        settings.auth.storage_path = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("ATTENDO_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("ATTENDO_LOG_FORMAT") {
        match serde_json::from_value(Value::String(v.to_lowercase())) {
            Ok(format) => settings.logging.format = format,
            Err(_) => tracing::warn!(
                key = "ATTENDO_LOG_FORMAT",
                value = %v,
                "invalid log format, ignoring"
            ),
        }
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
