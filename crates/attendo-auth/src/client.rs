//! Auth half of the remote store client.
//!
//! [`AuthClient`] owns the current [`AuthSession`] and is the only writer
//! of it. Every change (sign-in, refresh, sign-out) is persisted to the
//! configured storage file and broadcast to subscribers obtained from
//! [`AuthClient::on_auth_state_change`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use attendo_core::remote::API_KEY_HEADER;
use attendo_core::{FlowType, Identity, RemoteEndpoint};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tokio::sync::broadcast;

use crate::errors::AuthError;
use crate::pkce::{CHALLENGE_METHOD, generate_pkce};
use crate::storage;
use crate::types::{AuthChangeEvent, AuthSession, AuthStateChange, TokenResponse, now_ms};

/// Notifications buffered per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 16;

/// Construction options for [`AuthClient`].
#[derive(Clone, Debug, Default)]
pub struct AuthClientOptions {
    /// Redirect handshake used by [`AuthClient::authorize_url`].
    pub flow_type: FlowType,
    /// Where the session and pending verifier are persisted. `None` keeps
    /// them in memory only.
    pub storage_path: Option<PathBuf>,
    /// Per-request timeout. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

/// Client for the hosted auth API (`{url}/auth/v1`).
pub struct AuthClient {
    endpoint: RemoteEndpoint,
    http: reqwest::Client,
    options: AuthClientOptions,
    session: RwLock<Option<AuthSession>>,
    code_verifier: Mutex<Option<String>>,
    events: broadcast::Sender<AuthStateChange>,
    /// Set while a restored session has not been announced yet.
    initial_pending: AtomicBool,
    /// Serializes refreshes; refresh tokens are single-use.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl AuthClient {
    /// Build a client, restoring any persisted session and verifier.
    pub fn new(endpoint: RemoteEndpoint, options: AuthClientOptions) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let stored = options
            .storage_path
            .as_deref()
            .and_then(storage::load_auth_storage)
            .unwrap_or_default();
        if stored.session.is_some() {
            tracing::debug!("restored persisted auth session");
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            endpoint,
            http,
            options,
            initial_pending: AtomicBool::new(stored.session.is_some()),
            session: RwLock::new(stored.session),
            code_verifier: Mutex::new(stored.code_verifier),
            events,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Option<AuthSession> {
        self.session.read().clone()
    }

    /// Access token of the current session.
    pub fn access_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.access_token.clone())
    }

    /// Subscribe to auth-state notifications.
    ///
    /// Only changes made after this call are delivered. When the session
    /// was restored from storage, the first subscriber also receives an
    /// `InitialSession` notification carrying it.
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthStateChange> {
        let rx = self.events.subscribe();
        if self.initial_pending.swap(false, Ordering::SeqCst) {
            let session = self.session();
            if session.is_some() {
                let _ = self.events.send(AuthStateChange {
                    event: AuthChangeEvent::InitialSession,
                    session,
                });
            }
        }
        rx
    }

    /// Access token usable right now, refreshed first when it is expired
    /// or about to be. `None` when signed out.
    #[tracing::instrument(skip_all)]
    pub async fn valid_access_token(&self) -> Result<Option<String>, AuthError> {
        match self.session() {
            None => return Ok(None),
            Some(s) if !s.should_refresh() => return Ok(Some(s.access_token)),
            Some(_) => {}
        }

        let _guard = self.refresh_lock.lock().await;
        // a concurrent caller may have refreshed while we waited
        match self.session() {
            None => Ok(None),
            Some(s) if !s.should_refresh() => Ok(Some(s.access_token)),
            Some(_) => {
                tracing::info!("access token expired, refreshing");
                Ok(Some(self.refresh_session().await?.access_token))
            }
        }
    }

    /// Build the provider sign-in URL the browser should be sent to.
    ///
    /// With the PKCE flow a fresh verifier is generated and kept (and
    /// persisted) until [`Self::exchange_code_for_session`] consumes it.
    pub fn authorize_url(
        &self,
        provider: &str,
        redirect_to: Option<&str>,
    ) -> Result<String, AuthError> {
        let mut params: Vec<(&str, String)> = vec![("provider", provider.to_string())];
        if let Some(redirect) = redirect_to {
            params.push(("redirect_to", redirect.to_string()));
        }

        if self.options.flow_type == FlowType::Pkce {
            let pair = generate_pkce();
            params.push(("code_challenge", pair.challenge));
            params.push(("code_challenge_method", CHALLENGE_METHOD.to_string()));
            self.persist_verifier(Some(&pair.verifier));
            *self.code_verifier.lock() = Some(pair.verifier);
        }

        let url =
            reqwest::Url::parse_with_params(&self.endpoint.auth_url("authorize"), &params)
                .map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    /// Trade an authorization code for a session (PKCE flow).
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<AuthSession, AuthError> {
        let verifier = self
            .code_verifier
            .lock()
            .clone()
            .ok_or(AuthError::MissingVerifier)?;

        let session = self
            .post_token(
                "pkce",
                &json!({ "auth_code": code, "code_verifier": verifier }),
            )
            .await?;

        *self.code_verifier.lock() = None;
        self.persist_verifier(None);
        self.set_session(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Complete a sign-in from the URL the provider redirected back to.
    ///
    /// A `code` query parameter is exchanged (PKCE flow); tokens in the
    /// fragment are taken as-is (implicit flow). An `error_description`
    /// parameter becomes [`AuthError::Api`].
    #[tracing::instrument(skip_all)]
    pub async fn session_from_redirect(
        &self,
        redirect_url: &str,
    ) -> Result<AuthSession, AuthError> {
        let url =
            reqwest::Url::parse(redirect_url).map_err(|e| AuthError::InvalidUrl(e.to_string()))?;
        let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        if let Some(fragment) = url.fragment() {
            params.extend(
                reqwest::Url::parse(&format!("http://x/?{fragment}"))
                    .map(|u| u.query_pairs().into_owned().collect::<Vec<_>>())
                    .unwrap_or_default(),
            );
        }
        let get = |key: &str| params.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

        if let Some(description) = get("error_description").or_else(|| get("error")) {
            return Err(AuthError::Api {
                status: 0,
                message: description,
            });
        }
        if let Some(code) = get("code") {
            return self.exchange_code_for_session(&code).await;
        }

        let access_token = get("access_token").ok_or_else(|| AuthError::Api {
            status: 0,
            message: "redirect carries neither a code nor an access token".to_string(),
        })?;
        let expires_in: i64 = get("expires_in").and_then(|v| v.parse().ok()).unwrap_or(3600);
        let expires_at = get("expires_at")
            .and_then(|v| v.parse::<i64>().ok())
            .map_or_else(|| now_ms() + expires_in * 1000, |secs| secs * 1000);
        let mut session = AuthSession {
            access_token,
            refresh_token: get("refresh_token").unwrap_or_default(),
            token_type: get("token_type").unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: None,
        };
        session.user = self.fetch_user(&session.access_token).await?;
        self.set_session(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Email/password sign-in.
    #[tracing::instrument(skip_all)]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let session = self
            .post_token("password", &json!({ "email": email, "password": password }))
            .await?;
        self.set_session(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    /// Exchange the refresh token for a new session.
    ///
    /// A refresh token the server rejects (400/401) ends the session: it is
    /// dropped, the drop is persisted and `SignedOut` is broadcast.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        let refresh_token = self
            .session
            .read()
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(AuthError::NotSignedIn)?;

        let result = self
            .post_token("refresh_token", &json!({ "refresh_token": refresh_token }))
            .await;
        let mut session = match result {
            Ok(session) => session,
            Err(e) => {
                if matches!(e, AuthError::Api { status: 400 | 401, .. }) {
                    tracing::warn!("refresh token rejected, signing out: {e}");
                    self.set_session(AuthChangeEvent::SignedOut, None);
                }
                return Err(e);
            }
        };
        if session.user.is_none() {
            session.user = self.session.read().as_ref().and_then(|s| s.user.clone());
        }
        self.set_session(AuthChangeEvent::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }

    /// "Who am I": ask the auth API for the user behind the current session.
    ///
    /// Returns `Ok(None)` without a network call when signed out. An expired
    /// access token is refreshed first. Claims that differ from the ones
    /// held in the session are stored and broadcast as `UserUpdated`.
    #[tracing::instrument(skip_all)]
    pub async fn get_user(&self) -> Result<Option<Identity>, AuthError> {
        let Some(token) = self.valid_access_token().await? else {
            return Ok(None);
        };

        let user = self.fetch_user(&token).await?;
        let updated = match self.session.write().as_mut() {
            Some(current) if current.user != user => {
                current.user.clone_from(&user);
                Some(current.clone())
            }
            _ => None,
        };
        if let Some(session) = updated {
            self.set_session(AuthChangeEvent::UserUpdated, Some(session));
        }
        Ok(user)
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// The local session, any pending verifier and the auth file are
    /// dropped and `SignedOut` is broadcast even when the revocation call
    /// fails; a token the server already considers invalid (401/403/404)
    /// is not an error.
    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.access_token();
        *self.code_verifier.lock() = None;
        *self.session.write() = None;
        if let Some(path) = &self.options.storage_path {
            if let Err(e) = storage::clear_all_auth(path) {
                tracing::warn!("failed to remove auth file: {e}");
            }
        }
        tracing::debug!("signed out");
        let _ = self.events.send(AuthStateChange {
            event: AuthChangeEvent::SignedOut,
            session: None,
        });

        let Some(token) = token else {
            return Ok(());
        };
        let resp = self
            .http
            .post(self.endpoint.auth_url("logout?scope=global"))
            .header(API_KEY_HEADER, self.endpoint.api_key())
            .bearer_auth(token)
            .send()
            .await?;

        match resp.status().as_u16() {
            s if (200..300).contains(&s) => Ok(()),
            401 | 403 | 404 => Ok(()),
            _ => Err(api_error(resp).await),
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, AuthError> {
        let resp = self
            .http
            .get(self.endpoint.auth_url("user"))
            .header(API_KEY_HEADER, self.endpoint.api_key())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(Some(resp.json().await?))
    }

    async fn post_token(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> Result<AuthSession, AuthError> {
        let resp = self
            .http
            .post(self.endpoint.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header(API_KEY_HEADER, self.endpoint.api_key())
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        let data: TokenResponse = resp.json().await?;
        Ok(data.into_session())
    }

    fn set_session(&self, event: AuthChangeEvent, session: Option<AuthSession>) {
        (*self.session.write()).clone_from(&session);

        if let Some(path) = &self.options.storage_path {
            if let Err(e) = storage::save_session(path, session.as_ref()) {
                tracing::warn!("failed to persist auth session: {e}");
            }
        }

        tracing::debug!(?event, "auth state changed");
        // Err only means nobody is listening
        let _ = self.events.send(AuthStateChange { event, session });
    }

    fn persist_verifier(&self, verifier: Option<&str>) {
        if let Some(path) = &self.options.storage_path {
            if let Err(e) = storage::save_code_verifier(path, verifier) {
                tracing::warn!("failed to persist PKCE verifier: {e}");
            }
        }
    }
}

/// Turn a non-success auth API response into [`AuthError::Api`].
async fn api_error(resp: reqwest::Response) -> AuthError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or(text);
    AuthError::Api { status, message }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token_body(access: &str) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": format!("{access}-refresh"),
            "token_type": "bearer",
            "expires_in": 3600,
            "user": {"id": "u1", "email": "surveillant@univ.fr"}
        })
    }

    fn client(server: &MockServer, options: AuthClientOptions) -> AuthClient {
        AuthClient::new(RemoteEndpoint::new(server.uri(), "anon-key"), options).unwrap()
    }

    async fn signed_in(server: &MockServer) -> AuthClient {
        signed_in_with(server, AuthClientOptions::default()).await
    }

    async fn signed_in_with(server: &MockServer, options: AuthClientOptions) -> AuthClient {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1")))
            .mount(server)
            .await;
        let c = client(server, options);
        let _ = c.sign_in_with_password("surveillant@univ.fr", "pw").await.unwrap();
        c
    }

    async fn signed_in_expired(server: &MockServer, options: AuthClientOptions) -> AuthClient {
        let mut body = token_body("at-old");
        body["expires_in"] = json!(0);
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
        let c = client(server, options);
        let _ = c.sign_in_with_password("surveillant@univ.fr", "pw").await.unwrap();
        c
    }

    #[test]
    fn authorize_url_carries_pkce_challenge() {
        let c = AuthClient::new(
            RemoteEndpoint::new("https://abc.supabase.co", "anon"),
            AuthClientOptions::default(),
        )
        .unwrap();
        let url = c
            .authorize_url("azure", Some("http://localhost:5173/"))
            .unwrap();
        assert!(url.starts_with("https://abc.supabase.co/auth/v1/authorize?provider=azure"));
        assert!(url.contains("redirect_to=http%3A%2F%2Flocalhost%3A5173%2F"));
        assert!(url.contains("code_challenge="));
        assert!(url.contains("code_challenge_method=s256"));
        assert!(c.code_verifier.lock().is_some());
    }

    #[test]
    fn implicit_flow_has_no_challenge() {
        let c = AuthClient::new(
            RemoteEndpoint::new("https://abc.supabase.co", "anon"),
            AuthClientOptions {
                flow_type: FlowType::Implicit,
                ..Default::default()
            },
        )
        .unwrap();
        let url = c.authorize_url("github", None).unwrap();
        assert!(!url.contains("code_challenge"));
        assert!(c.code_verifier.lock().is_none());
    }

    #[tokio::test]
    async fn exchange_without_verifier_fails() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        assert_matches!(
            c.exchange_code_for_session("code").await,
            Err(AuthError::MissingVerifier)
        );
    }

    #[tokio::test]
    async fn exchange_code_sends_verifier_and_emits_signed_in() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        let _ = c.authorize_url("azure", None).unwrap();
        let verifier = c.code_verifier.lock().clone().unwrap();

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "pkce"))
            .and(header("apikey", "anon-key"))
            .and(body_json(json!({"auth_code": "abc", "code_verifier": verifier})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-1")))
            .expect(1)
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        let session = c.exchange_code_for_session("abc").await.unwrap();
        assert_eq!(session.access_token, "at-1");
        assert!(c.code_verifier.lock().is_none());

        let change = rx.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedIn);
        assert_eq!(change.identity().unwrap().id.as_str(), "u1");
    }

    #[tokio::test]
    async fn verifier_survives_restart_through_storage() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let options = AuthClientOptions {
            storage_path: Some(dir.path().join("auth.json")),
            ..Default::default()
        };

        let first = client(&server, options.clone());
        let _ = first.authorize_url("azure", None).unwrap();
        let verifier = first.code_verifier.lock().clone();
        drop(first);

        let second = client(&server, options);
        assert_eq!(*second.code_verifier.lock(), verifier);
    }

    #[tokio::test]
    async fn session_is_persisted_and_restored() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-9")))
            .mount(&server)
            .await;
        let options = AuthClientOptions {
            storage_path: Some(dir.path().join("auth.json")),
            ..Default::default()
        };

        let first = client(&server, options.clone());
        let _ = first.sign_in_with_password("a@b.c", "pw").await.unwrap();
        drop(first);

        let second = client(&server, options);
        assert_eq!(second.access_token().as_deref(), Some("at-9"));
    }

    #[tokio::test]
    async fn token_error_surfaces_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;
        let c = client(&server, AuthClientOptions::default());
        let err = c.sign_in_with_password("a@b.c", "wrong").await.unwrap_err();
        assert_matches!(
            err,
            AuthError::Api { status: 400, ref message } if message == "Invalid login credentials"
        );
        assert!(c.session().is_none());
    }

    #[tokio::test]
    async fn get_user_without_session_is_none() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        assert!(c.get_user().await.unwrap().is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_user_sends_bearer() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "surveillant@univ.fr", "role": "authenticated"
            })))
            .mount(&server)
            .await;

        let user = c.get_user().await.unwrap().unwrap();
        assert_eq!(user.role.as_deref(), Some("authenticated"));
    }

    #[tokio::test]
    async fn get_user_rejected_token_is_error() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 401, "msg": "invalid JWT"
            })))
            .mount(&server)
            .await;
        assert_matches!(c.get_user().await, Err(AuthError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn refresh_emits_token_refreshed_and_keeps_user() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({"refresh_token": "at-1-refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "at-2", "refresh_token": "rt-2", "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        let session = c.refresh_session().await.unwrap();
        assert_eq!(session.access_token, "at-2");
        assert_eq!(session.user.unwrap().id.as_str(), "u1");
        assert_eq!(rx.recv().await.unwrap().event, AuthChangeEvent::TokenRefreshed);
    }

    #[tokio::test]
    async fn refresh_without_session_fails() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        assert_matches!(c.refresh_session().await, Err(AuthError::NotSignedIn));
    }

    #[tokio::test]
    async fn sign_out_clears_even_when_token_rejected() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        c.sign_out().await.unwrap();
        assert!(c.session().is_none());
        let change = rx.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
        assert!(change.session.is_none());
    }

    #[tokio::test]
    async fn redirect_with_error_description() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        let err = c
            .session_from_redirect("http://localhost/?error=access_denied&error_description=Denied")
            .await
            .unwrap_err();
        assert_matches!(err, AuthError::Api { ref message, .. } if message == "Denied");
    }

    #[tokio::test]
    async fn redirect_with_fragment_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer frag-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u7"})))
            .mount(&server)
            .await;
        let c = client(
            &server,
            AuthClientOptions {
                flow_type: FlowType::Implicit,
                ..Default::default()
            },
        );
        let session = c
            .session_from_redirect(concat!(
                "http://localhost/#access_token=frag-token",
                "&refresh_token=r&expires_in=60&token_type=bearer",
            ))
            .await
            .unwrap();
        assert_eq!(session.user.unwrap().id.as_str(), "u7");
        assert_eq!(c.access_token().as_deref(), Some("frag-token"));
    }

    #[tokio::test]
    async fn valid_token_is_returned_without_refresh() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        assert_eq!(c.valid_access_token().await.unwrap().as_deref(), Some("at-1"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_once() {
        let server = MockServer::start().await;
        let c = signed_in_expired(&server, AuthClientOptions::default()).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({"refresh_token": "at-old-refresh"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-new")))
            .expect(1)
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        assert_eq!(c.valid_access_token().await.unwrap().as_deref(), Some("at-new"));
        assert_eq!(c.valid_access_token().await.unwrap().as_deref(), Some("at-new"));
        assert_eq!(rx.recv().await.unwrap().event, AuthChangeEvent::TokenRefreshed);
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out_and_persists() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let auth_file = dir.path().join("auth.json");
        let options = AuthClientOptions {
            storage_path: Some(auth_file.clone()),
            ..Default::default()
        };
        let c = signed_in_expired(&server, options).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token: Already Used"
            })))
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        assert_matches!(c.valid_access_token().await, Err(AuthError::Api { status: 400, .. }));
        assert!(c.session().is_none());
        let change = rx.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::SignedOut);
        assert!(change.session.is_none());
        assert!(storage::load_auth_storage(&auth_file).unwrap().session.is_none());

        assert!(c.valid_access_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transient_refresh_failure_keeps_session() {
        let server = MockServer::start().await;
        let c = signed_in_expired(&server, AuthClientOptions::default()).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert_matches!(c.valid_access_token().await, Err(AuthError::Api { status: 503, .. }));
        assert_eq!(c.access_token().as_deref(), Some("at-old"));
    }

    #[tokio::test]
    async fn get_user_refreshes_expired_token_first() {
        let server = MockServer::start().await;
        let c = signed_in_expired(&server, AuthClientOptions::default()).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("at-new")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer at-new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "surveillant@univ.fr"
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(c.get_user().await.unwrap().unwrap().id.as_str(), "u1");
    }

    #[tokio::test]
    async fn changed_claims_emit_user_updated() {
        let server = MockServer::start().await;
        let c = signed_in(&server).await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "surveillant@univ.fr", "role": "authenticated"
            })))
            .mount(&server)
            .await;

        let mut rx = c.on_auth_state_change();
        let _ = c.get_user().await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::UserUpdated);
        assert_eq!(change.identity().unwrap().role.as_deref(), Some("authenticated"));
        assert_eq!(
            c.session().unwrap().user.unwrap().role.as_deref(),
            Some("authenticated")
        );

        // same claims again: nothing to announce
        let _ = c.get_user().await.unwrap();
        assert_matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn restored_session_is_announced_to_first_subscriber() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let options = AuthClientOptions {
            storage_path: Some(dir.path().join("auth.json")),
            ..Default::default()
        };
        drop(signed_in_with(&server, options.clone()).await);

        let restored = client(&server, options);
        let mut first = restored.on_auth_state_change();
        let change = first.recv().await.unwrap();
        assert_eq!(change.event, AuthChangeEvent::InitialSession);
        assert_eq!(change.identity().unwrap().id.as_str(), "u1");

        let mut second = restored.on_auth_state_change();
        assert_matches!(second.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn fresh_client_announces_nothing() {
        let server = MockServer::start().await;
        let c = client(&server, AuthClientOptions::default());
        let mut rx = c.on_auth_state_change();
        assert_matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty));
    }

    #[tokio::test]
    async fn sign_out_removes_auth_file_and_verifier() {
        let server = MockServer::start().await;
        let dir = tempfile::TempDir::new().unwrap();
        let auth_file = dir.path().join("auth.json");
        let options = AuthClientOptions {
            storage_path: Some(auth_file.clone()),
            ..Default::default()
        };
        let c = signed_in_with(&server, options).await;
        let _ = c.authorize_url("azure", None).unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        c.sign_out().await.unwrap();
        assert!(!auth_file.exists());
        assert!(c.code_verifier.lock().is_none());
    }
}
