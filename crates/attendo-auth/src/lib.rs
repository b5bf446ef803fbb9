//! # attendo-auth
//!
//! Authentication against the hosted auth API and the application's
//! identity tracker.
//!
//! - [`AuthClient`]: PKCE redirect sign-in, code exchange, refresh, "who am
//!   I", sign-out; persists the session to `~/.attendo/auth.json` and
//!   broadcasts every change
//! - [`AuthContext`]: the reactive "current identity or none" cell, built
//!   once at the application root and kept current by a single listener
//!
//! ```no_run
//! # async fn demo(endpoint: attendo_core::RemoteEndpoint) -> Result<(), attendo_auth::AuthError> {
//! use std::sync::Arc;
//! use attendo_auth::{AuthClient, AuthClientOptions, AuthContext};
//!
//! let client = Arc::new(AuthClient::new(endpoint, AuthClientOptions::default())?);
//! let ctx = AuthContext::new(client);
//! ctx.init().await;
//! println!("{:?}", ctx.current_identity());
//! # Ok(()) }
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod pkce;
pub mod storage;
pub mod tracker;
pub mod types;

pub use client::{AuthClient, AuthClientOptions};
pub use errors::AuthError;
pub use pkce::{PkcePair, generate_pkce};
pub use storage::{AuthStorage, load_auth_storage, save_auth_storage};
pub use tracker::{AuthBackend, AuthContext, SubscriptionHandle};
pub use types::{AuthChangeEvent, AuthSession, AuthStateChange, now_ms};
