//! Subcommands and their handlers.

use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use attendo_core::SessionComponentId;
use attendo_routes::Router;
use clap::Subcommand;
use serde::Serialize;

use crate::app::App;

/// Environment variable read by `sign-in` for the password.
pub(crate) const PASSWORD_ENV: &str = "ATTENDO_PASSWORD";

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show the signed-in user.
    Whoami,
    /// Print the provider sign-in URL and remember the PKCE verifier.
    Login {
        /// OAuth provider (e.g. `azure`). Defaults to `auth.provider`.
        #[arg(long)]
        provider: Option<String>,
        /// Where the provider sends the browser back.
        #[arg(long)]
        redirect_to: Option<String>,
    },
    /// Finish a login with the authorization code or the full redirect URL.
    Exchange {
        /// Code, or the URL the browser landed on.
        code: String,
    },
    /// Sign in with email and password (password read from `ATTENDO_PASSWORD`).
    SignIn {
        /// Account email.
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the local session.
    Logout,
    /// Exam sessions.
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Exam events of a teaching unit.
    #[command(subcommand)]
    Events(EventsCommand),
    /// Resolve a navigation path.
    Route {
        /// Path such as `/sessions/1/ue/2/Maths`.
        path: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SessionsCommand {
    /// List sessions.
    List,
    /// Create a session.
    Add {
        /// Session label.
        label: String,
        /// Do not ask the store to send the created row back.
        #[arg(long)]
        minimal: bool,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum EventsCommand {
    /// List events of a session component.
    List {
        /// Session component id.
        session_compo: String,
    },
    /// Create an event under a session component.
    Add {
        /// Session component id.
        session_compo: String,
        /// Event label.
        label: String,
        /// Do not ask the store to send the created row back.
        #[arg(long)]
        minimal: bool,
    },
}

impl Command {
    /// Whether the command talks to the remote store.
    pub(crate) fn needs_remote(&self) -> bool {
        !matches!(self, Self::Route { .. })
    }
}

/// Run a command that works without the remote store.
pub(crate) fn run_local(command: Command) -> Result<String> {
    match command {
        Command::Route { path } => describe_route(&path),
        other => bail!("{other:?} needs the remote store"),
    }
}

/// Run a command and return its output.
pub(crate) async fn run(app: &App, command: Command) -> Result<String> {
    match command {
        Command::Whoami => {
            app.identity.init().await;
            match app.identity.current_identity() {
                Some(user) => to_json(&user),
                None => Ok("not signed in".to_string()),
            }
        }
        Command::Login {
            provider,
            redirect_to,
        } => {
            let Some(provider) = provider.or_else(|| app.default_provider.clone()) else {
                bail!("no provider given and auth.provider is not set");
            };
            let redirect = redirect_to.or_else(|| app.redirect_to.clone());
            app.auth
                .authorize_url(&provider, redirect.as_deref())
                .context("Failed to build sign-in URL")
        }
        Command::Exchange { code } => {
            let session = if code.starts_with("http://") || code.starts_with("https://") {
                app.auth.session_from_redirect(&code).await
            } else {
                app.auth.exchange_code_for_session(&code).await
            }
            .context("Code exchange failed")?;
            tracing::info!("signed in");
            signed_in_as(session.user.as_ref())
        }
        Command::SignIn { email } => {
            let password = std::env::var(PASSWORD_ENV)
                .with_context(|| format!("{PASSWORD_ENV} is not set"))?;
            let session = app
                .auth
                .sign_in_with_password(&email, &password)
                .await
                .context("Sign-in failed")?;
            tracing::info!("signed in");
            signed_in_as(session.user.as_ref())
        }
        Command::Logout => {
            app.auth.sign_out().await.context("Sign-out failed")?;
            Ok("signed out".to_string())
        }
        Command::Sessions(SessionsCommand::List) => {
            to_json(&attendo_store::fetch_sessions(&app.rest).await?)
        }
        Command::Sessions(SessionsCommand::Add { label, minimal }) => {
            let returning = app.insert_return(minimal);
            let rows = attendo_store::add_session(&app.rest, &label, returning).await?;
            to_json(&rows)
        }
        Command::Events(EventsCommand::List { session_compo }) => {
            let id = SessionComponentId::from(session_compo);
            to_json(&attendo_store::fetch_events(&app.rest, &id).await?)
        }
        Command::Events(EventsCommand::Add {
            session_compo,
            label,
            minimal,
        }) => {
            let id = SessionComponentId::from(session_compo);
            let returning = app.insert_return(minimal);
            let rows = attendo_store::add_event(&app.rest, &id, &label, returning).await?;
            to_json(&rows)
        }
        Command::Route { path } => describe_route(&path),
    }
}

/// Describe what `path` navigates to.
pub(crate) fn describe_route(path: &str) -> Result<String> {
    let router = Router::new();
    let Some(matched) = router.resolve(path) else {
        bail!("no route matches {path}");
    };

    let mut out = String::new();
    let _ = writeln!(out, "route: {}", matched.name());
    let _ = writeln!(out, "view:  {:?}", matched.load_view());
    for (name, value) in matched.params() {
        let _ = writeln!(out, "  {name} = {value}");
    }
    let trail: Vec<_> = router.breadcrumbs(path).iter().map(|c| c.label).collect();
    if !trail.is_empty() {
        let _ = writeln!(out, "trail: {}", trail.join(" › "));
    }
    Ok(out.trim_end().to_string())
}

fn signed_in_as(user: Option<&attendo_core::Identity>) -> Result<String> {
    Ok(match user {
        Some(user) => format!("signed in as {}", user.display_name()),
        None => "signed in".to_string(),
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to encode output")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use attendo_settings::AttendoSettings;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer, dir: &tempfile::TempDir) -> App {
        let mut settings = AttendoSettings::default();
        settings.remote.url = server.uri();
        settings.remote.api_key = "anon".into();
        let auth_file = dir.path().join("auth.json");
        settings.auth.storage_path = Some(auth_file.to_string_lossy().into_owned());
        App::from_settings(&settings).unwrap()
    }

    #[test]
    fn route_description() {
        let out = describe_route("/sessions/1/ue/2/Maths/event/3/room/B12").unwrap();
        assert!(out.contains("route: AttendanceView"));
        assert!(out.contains("view:  Attendance"));
        assert!(out.contains("roomId = B12"));
        assert!(out.ends_with("trail: Sessions › Session › UE › épreuve › local"));
    }

    #[test]
    fn unknown_route_is_error() {
        assert!(describe_route("/nowhere").is_err());
    }

    #[test]
    fn unconfigured_store_is_error() {
        let err = App::from_settings(&AttendoSettings::default()).err().unwrap();
        assert!(err.to_string().contains("not configured"));
    }

    #[tokio::test]
    async fn whoami_signed_out() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&server, &dir);
        let out = run(&app, Command::Whoami).await.unwrap();
        assert_eq!(out, "not signed in");
        assert!(app.identity.is_listening());
        app.shutdown();
        assert!(!app.identity.is_listening());
    }

    #[tokio::test]
    async fn login_prints_pkce_url() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&server, &dir);
        let out = run(
            &app,
            Command::Login {
                provider: Some("azure".into()),
                redirect_to: Some("http://localhost:5173/".into()),
            },
        )
        .await
        .unwrap();
        assert!(out.contains("/auth/v1/authorize?"));
        assert!(out.contains("provider=azure"));
        assert!(out.contains("code_challenge="));
    }

    #[tokio::test]
    async fn login_without_provider_fails() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let app = app(&server, &dir);
        let result = run(
            &app,
            Command::Login {
                provider: None,
                redirect_to: None,
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn sessions_add_and_list() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/rest/v1/session"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([{"label": "Session Janvier 2025"}])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"id": 1, "label": "Session Janvier 2025"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "label": "Session Janvier 2025"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(&server, &dir);
        let added = run(
            &app,
            Command::Sessions(SessionsCommand::Add {
                label: "Session Janvier 2025".into(),
                minimal: false,
            }),
        )
        .await
        .unwrap();
        assert!(added.contains("Session Janvier 2025"));

        let listed = run(&app, Command::Sessions(SessionsCommand::List)).await.unwrap();
        let rows: serde_json::Value = serde_json::from_str(&listed).unwrap();
        assert_eq!(rows[0]["label"], "Session Janvier 2025");
    }

    #[tokio::test]
    async fn events_list_propagates_remote_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/event"))
            .and(query_param("session_compo", "eq.bad-id"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "22P02",
                "message": "invalid input syntax for type bigint"
            })))
            .mount(&server)
            .await;

        let app = app(&server, &dir);
        let err = run(
            &app,
            Command::Events(EventsCommand::List {
                session_compo: "bad-id".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("select on event failed (400)"));
    }

    #[tokio::test]
    async fn minimal_add_prints_empty_list() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/rest/v1/event"))
            .and(header("prefer", "return=minimal"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(&server, &dir);
        let out = run(
            &app,
            Command::Events(EventsCommand::Add {
                session_compo: "ue-42".into(),
                label: "Epreuve finale".into(),
                minimal: true,
            }),
        )
        .await
        .unwrap();
        assert_eq!(out, "[]");
    }
}
