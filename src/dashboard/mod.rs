use crate::{
    auth::{
        session::{or_anonymous, spawn_sweeper},
        AuthGate, MemoryStore, SessionId, SessionSettings, SessionStore, TokenGenerator,
    },
    config::ConfigHandle,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{any, get},
    Extension, Router,
};
use secrecy::SecretString;
use std::{path::Path, sync::Arc, time::Duration};
use tokio::{net::TcpListener, task::JoinHandle};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod cookie;
pub(crate) mod handlers;
pub mod render;

pub use cookie::CookieSettings;
pub use render::{Page, RenderError, Renderer};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared by every handler through an `Extension`.
pub struct AppState {
    config: Arc<ConfigHandle>,
    gate: AuthGate,
    renderer: Renderer,
    cookies: CookieSettings,
    session_lifetime: Duration,
}

impl AppState {
    /// Session and cookie settings are taken from the current snapshot and stay
    /// fixed for the life of the process.
    #[must_use]
    pub fn new(config: Arc<ConfigHandle>, store: Arc<dyn SessionStore>, renderer: Renderer) -> Self {
        let snapshot = config.snapshot();
        let app = &snapshot.app;
        let gate = AuthGate::new(
            store,
            TokenGenerator::new(SecretString::from(app.salt.clone())),
            app.remember_lifetime(),
        );
        Self {
            cookies: CookieSettings::from_app(app),
            session_lifetime: app.session_lifetime(),
            config,
            gate,
            renderer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    #[must_use]
    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieSettings {
        &self.cookies
    }

    /// Cookie for `session`, valid for what is left of its absolute lifetime.
    pub(crate) async fn session_cookie(&self, session: &SessionId) -> Option<HeaderValue> {
        let max_age = or_anonymous(self.gate.store().expires_in(session).await)
            .unwrap_or(self.session_lifetime);
        self.cookies
            .session_cookie(session, max_age)
            .map_err(|err| error!("Failed to build session cookie: {err}"))
            .ok()
    }
}

/// Routes and middleware, without binding a socket.
pub fn router(state: Arc<AppState>, asset_dir: &Path) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/not-found", get(handlers::not_found))
        .route("/ping", any(handlers::ping))
        .nest_service("/assets", ServeDir::new(asset_dir))
        .fallback(handlers::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
}

/// Start the server
/// # Errors
/// Return error if the templates cannot be loaded or the port cannot be bound
pub async fn new(port: u16, config: Arc<ConfigHandle>) -> Result<()> {
    let snapshot = config.snapshot();

    let renderer = Renderer::load(&snapshot.app.template_dir).with_context(|| {
        format!(
            "Failed to load templates from {}",
            snapshot.app.template_dir.display()
        )
    })?;

    let store = Arc::new(MemoryStore::new(SessionSettings {
        lifetime: snapshot.app.session_lifetime(),
        idle_timeout: snapshot.app.idle_timeout(),
    }));

    // Expired sessions are dropped in the background; lookups already ignore them.
    let sweeper = spawn_sweeper(store.clone(), SWEEP_INTERVAL);
    let reloader = spawn_reloader(config.clone())?;

    let state = Arc::new(AppState::new(config, store, renderer));
    let app = router(state, &snapshot.app.asset_dir);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    reloader.abort();

    Ok(())
}

/// Reload users, groups and page attributes on `SIGHUP`.
#[cfg(unix)]
fn spawn_reloader(config: Arc<ConfigHandle>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    Ok(tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match config.reload() {
                Ok(fresh) => info!(
                    users = fresh.users.len(),
                    groups = fresh.groups.len(),
                    "Configuration reloaded"
                ),
                Err(err) => error!("Failed to reload configuration, keeping the previous one: {err}"),
            }
        }
    }))
}

#[cfg(not(unix))]
fn spawn_reloader(_config: Arc<ConfigHandle>) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async {}))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
