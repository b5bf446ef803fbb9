//! Auth session and notification types.

use attendo_core::Identity;
use serde::{Deserialize, Serialize};

/// Refresh this long before the access token actually expires.
pub const EXPIRY_MARGIN_MS: i64 = 10_000;

/// Token bundle issued by the auth API after a successful sign-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token sent to the data API.
    pub access_token: String,
    /// Single-use token for obtaining the next session.
    pub refresh_token: String,
    /// Usually `"bearer"`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at: i64,
    /// User the session belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    /// Whether the access token is expired or about to be.
    pub fn should_refresh(&self) -> bool {
        now_ms() + EXPIRY_MARGIN_MS >= self.expires_at
    }
}

/// What happened to the auth session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// A session was restored from storage.
    InitialSession,
    /// A new session was obtained.
    SignedIn,
    /// The session was discarded.
    SignedOut,
    /// The access token was renewed.
    TokenRefreshed,
    /// The user's claims were re-fetched.
    UserUpdated,
}

/// Notification delivered to every auth-state subscriber.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthStateChange {
    /// Kind of change.
    pub event: AuthChangeEvent,
    /// Session after the change; `None` after sign-out.
    pub session: Option<AuthSession>,
}

impl AuthStateChange {
    /// Identity carried by the new session, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.session.as_ref().and_then(|s| s.user.clone())
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    /// Epoch seconds, when the server sends it.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<Identity>,
}

impl TokenResponse {
    pub(crate) fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .map_or_else(|| calculate_expires_at(self.expires_in), |secs| secs * 1000);
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(default_token_type),
            expires_at,
            user: self.user,
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Expiration timestamp from `expires_in` seconds.
pub fn calculate_expires_at(expires_in_seconds: i64) -> i64 {
    now_ms() + expires_in_seconds * 1000
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
