//! Auth error types.

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The auth API answered with a non-success status.
    #[error("auth API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description from the response body.
        message: String,
    },

    /// A code exchange was attempted without a pending PKCE verifier.
    #[error("no PKCE code verifier pending; start a sign-in first")]
    MissingVerifier,

    /// The operation needs a session and there is none.
    #[error("not signed in")]
    NotSignedIn,

    /// The authorize URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
