//! Identity tracker.
//!
//! [`AuthContext`] holds "current identity or none" for the application.
//! It is built once at the root and shared as `Arc<AuthContext>`; consumers
//! read it with [`AuthContext::current_identity`] or react to it through
//! [`AuthContext::watch`].
//!
//! The first call to [`AuthContext::init`] registers one auth-change
//! listener and issues one "who am I" query. Later calls, from any number
//! of consumers, do nothing. Until the query resolves the cell reads `None`.
//! A failed query also resolves to `None`: being signed out is not an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use attendo_core::Identity;
use parking_lot::Mutex;
use tokio::sync::{OnceCell, broadcast, watch};
use tokio::task::JoinHandle;

use crate::client::AuthClient;
use crate::errors::AuthError;
use crate::types::{AuthChangeEvent, AuthStateChange};

/// The two auth primitives the tracker needs.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Resolve the user behind the current session.
    async fn get_user(&self) -> Result<Option<Identity>, AuthError>;

    /// Register for auth-state notifications.
    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange>;
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        AuthClient::get_user(self).await
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.on_auth_state_change()
    }
}

/// Long-lived auth-change listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stop listening.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// Whether the listener has stopped (sender gone or unsubscribed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Application-wide auth context.
pub struct AuthContext {
    backend: Arc<dyn AuthBackend>,
    identity: Arc<watch::Sender<Option<Identity>>>,
    /// Set once any notification has been applied, so a slow initial
    /// query cannot overwrite a newer state.
    notified: Arc<AtomicBool>,
    initialized: OnceCell<()>,
    listener: Mutex<Option<SubscriptionHandle>>,
}

impl AuthContext {
    /// Create an uninitialized context. The cell reads `None`.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Arc<Self> {
        let (identity, _) = watch::channel(None);
        Arc::new(Self {
            backend,
            identity: Arc::new(identity),
            notified: Arc::new(AtomicBool::new(false)),
            initialized: OnceCell::new(),
            listener: Mutex::new(None),
        })
    }

    /// Latest known identity. May lag behind the remote state until the
    /// next notification arrives.
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Receiver that observes every identity change.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Whether a listener is currently registered.
    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Subscribe and resolve the initial identity, once.
    ///
    /// Must run inside a Tokio runtime: the listener is a spawned task.
    #[tracing::instrument(skip_all, name = "auth_context_init")]
    pub async fn init(&self) {
        let _ = self
            .initialized
            .get_or_init(|| async {
                let handle = self.spawn_listener();
                *self.listener.lock() = Some(handle);
                self.resolve_initial_identity().await;
            })
            .await;
    }

    /// Run [`Self::init`] in the background and return immediately.
    pub fn spawn_init(self: &Arc<Self>) -> JoinHandle<()> {
        let ctx = Arc::clone(self);
        tokio::spawn(async move { ctx.init().await })
    }

    /// Unregister the auth-change listener. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().take() {
            tracing::debug!("unsubscribing auth listener");
            handle.unsubscribe();
        }
    }

    fn spawn_listener(&self) -> SubscriptionHandle {
        let mut rx = self.backend.subscribe();
        let identity = Arc::clone(&self.identity);
        let notified = Arc::clone(&self.notified);

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) if change.event == AuthChangeEvent::InitialSession => {
                        // the initial query decides the starting identity
                        tracing::debug!("restored session announced");
                    }
                    Ok(change) => {
                        tracing::debug!(event = ?change.event, "auth state notification");
                        notified.store(true, Ordering::SeqCst);
                        let _ = identity.send_replace(change.identity());
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "auth listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("auth notifications closed, listener exiting");
                        break;
                    }
                }
            }
        });
        SubscriptionHandle { task }
    }

    async fn resolve_initial_identity(&self) {
        let user = match self.backend.get_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!("initial identity lookup failed, treating as signed out: {e}");
                None
            }
        };

        let _ = self.identity.send_if_modified(|current| {
            if self.notified.load(Ordering::SeqCst) {
                return false;
            }
            *current = user;
            true
        });
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
