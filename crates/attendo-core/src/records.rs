//! Rows exchanged with the remote store.
//!
//! Read-side records keep any column they do not name in a flattened
//! `extra` map, so a row is handed back to callers exactly as the store
//! returned it. Write-side records (`New*`) carry only the columns this
//! client is allowed to set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ids::{EventId, SessionComponentId, SessionId, UserId};

/// Table holding examination sessions.
pub const SESSION_TABLE: &str = "session";

/// Table holding exam events.
pub const EVENT_TABLE: &str = "event";

/// An examination period grouping teaching units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Store-assigned key.
    pub id: SessionId,
    /// Human-readable name, e.g. `"Session Janvier 2025"`. Nullable.
    #[serde(default)]
    pub label: Option<String>,
    /// Columns not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An exam occurrence within a teaching unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned key.
    pub id: EventId,
    /// Owning teaching unit. Set at creation, never changed. Nullable.
    #[serde(default)]
    pub session_compo: Option<SessionComponentId>,
    /// Human-readable name, e.g. `"Epreuve finale"`. Nullable.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether attendance for this event has been closed. `null` reads as
    /// `false`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    /// Columns not modelled here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Insert payload for the `session` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewSession {
    label: String,
}

impl NewSession {
    /// Payload for a session with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The label that will be written.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Insert payload for the `event` table.
///
/// Events are always written with `completed = false`; there is no way to
/// build a payload that says otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    session_compo: SessionComponentId,
    label: String,
    completed: bool,
}

impl NewEvent {
    /// Payload for an event attached to `session_compo`.
    pub fn new(session_compo: SessionComponentId, label: impl Into<String>) -> Self {
        Self {
            session_compo,
            label: label.into(),
            completed: false,
        }
    }

    /// Owning teaching unit.
    pub fn session_compo(&self) -> &SessionComponentId {
        &self.session_compo
    }

    /// The label that will be written.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// An authenticated user as issued by the auth subsystem.
///
/// Only the claims the application reads are named; everything else the
/// auth API sends is kept in `claims`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier.
    pub id: UserId,
    /// Audience the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Database role, usually `"authenticated"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Primary email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Claims managed by the auth provider (provider name, etc.).
    #[serde(default)]
    pub app_metadata: Map<String, Value>,
    /// Claims the user can edit (display name, etc.).
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    /// Account creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last successful sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    /// Remaining claims.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl Identity {
    /// Best human-readable name: `user_metadata.full_name`, then email, then id.
    pub fn display_name(&self) -> &str {
        self.user_metadata
            .get("full_name")
            .and_then(Value::as_str)
            .or(self.email.as_deref())
            .unwrap_or_else(|| self.id.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
