/// HTTP API for the three-tier token flow
///
/// Routes:
/// - `POST /email-token`: mail a tier-1 verification token
/// - `GET /auth-token`: exchange a tier-1 token for a session token
/// - `POST /juicebox-token`: exchange a session token for a realm token
/// - `GET /.well-known/*`: deep-link association manifests
/// - `GET /health`
mod handlers;
mod middleware;
mod well_known;

pub use handlers::bearer_token;
pub use middleware::RequestDeadline;
pub use well_known::WellKnownDocuments;

use crate::config::Settings;
use crate::security::{
    Clock, EphemeralKeyStore, SecretSource, TokenIssuer, TokenVerifier,
};
use crate::services::Mailer;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared HTTP server state
pub struct AppState {
    pub key_store: Arc<EphemeralKeyStore>,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
    pub mailer: Arc<dyn Mailer>,
    pub well_known: WellKnownDocuments,
    pub request_timeout: Duration,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        mailer: Arc<dyn Mailer>,
        well_known: WellKnownDocuments,
    ) -> Self {
        let key_store = Arc::new(EphemeralKeyStore::new());
        Self {
            issuer: TokenIssuer::new(&settings.signing_keys, &settings.tokens),
            verifier: TokenVerifier::new(
                Arc::clone(&key_store),
                &settings.signing_keys,
                &settings.tokens,
            ),
            key_store,
            mailer,
            well_known,
            request_timeout: settings.server.request_timeout(),
            body_limit: settings.server.body_limit_bytes,
        }
    }

    /// Replace the clock used for claim timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.issuer = self.issuer.with_clock(clock);
        self
    }

    /// Replace the source of per-subject verification secrets
    pub fn with_secret_source(mut self, secrets: Arc<dyn SecretSource>) -> Self {
        self.issuer = self.issuer.with_secret_source(secrets);
        self
    }
}

/// Build the HTTP router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/email-token", post(handlers::email_token))
        .route("/auth-token", get(handlers::auth_token))
        .route("/juicebox-token", post(handlers::juicebox_token))
        .route(
            "/.well-known/apple-app-site-association",
            get(well_known::apple_app_site_association),
        )
        .route("/.well-known/assetlinks.json", get(well_known::asset_links))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::deadline_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(middleware::correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Start HTTP server, returning once `shutdown` resolves and in-flight
/// requests have drained
pub async fn start_http_server(
    state: Arc<AppState>,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting token HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
