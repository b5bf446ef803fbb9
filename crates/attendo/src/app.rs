//! Wiring of the remote store clients and the identity context.

use std::sync::Arc;

use anyhow::{Context, Result};
use attendo_auth::{AuthClient, AuthClientOptions, AuthContext};
use attendo_core::InsertReturn;
use attendo_settings::AttendoSettings;
use attendo_store::RestClient;

/// Everything a command needs to talk to the remote store.
pub(crate) struct App {
    pub(crate) auth: Arc<AuthClient>,
    pub(crate) rest: RestClient,
    pub(crate) identity: Arc<AuthContext>,
    pub(crate) insert_return: InsertReturn,
    pub(crate) default_provider: Option<String>,
    pub(crate) redirect_to: Option<String>,
}

impl App {
    /// Build the clients. Fails when the store URL or API key is missing.
    pub(crate) fn from_settings(settings: &AttendoSettings) -> Result<Self> {
        let endpoint = settings
            .remote
            .endpoint()
            .context("remote store is not configured")?;
        let timeout = settings.remote.request_timeout();

        let auth = Arc::new(
            AuthClient::new(
                endpoint.clone(),
                AuthClientOptions {
                    flow_type: settings.remote.flow_type,
                    storage_path: Some(settings.auth.storage_path()),
                    request_timeout: timeout,
                },
            )
            .context("Failed to build auth client")?,
        );
        let rest = RestClient::new(endpoint, timeout)
            .context("Failed to build data client")?
            .with_token_source(auth.clone());
        let identity = AuthContext::new(auth.clone());

        tracing::debug!(url = %auth.endpoint().url(), "remote store clients ready");
        Ok(Self {
            auth,
            rest,
            identity,
            insert_return: settings.remote.insert_return,
            default_provider: settings.auth.provider.clone(),
            redirect_to: settings.auth.redirect_to.clone(),
        })
    }

    /// Insert mode for an add command; `--minimal` wins over settings.
    pub(crate) fn insert_return(&self, minimal: bool) -> InsertReturn {
        if minimal {
            InsertReturn::Minimal
        } else {
            self.insert_return
        }
    }

    /// Release the auth listener.
    pub(crate) fn shutdown(&self) {
        self.identity.shutdown();
    }
}
