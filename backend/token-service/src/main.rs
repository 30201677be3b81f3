/// Token Service Main Entry Point
///
/// Starts the HTTP server with:
/// - Signing keys (AWS Secrets Manager or environment)
/// - Email service (SMTP or no-op)
/// - In-memory ephemeral key store
use anyhow::{Context, Result};
use std::sync::Arc;
use token_service::{
    config::Settings,
    http::{start_http_server, AppState, WellKnownDocuments},
    services::EmailService,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "token_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Token Service");

    // Load configuration
    let settings = Settings::load()
        .await
        .context("Failed to load configuration")?;
    info!(
        realm_kid = %settings.signing_keys.realm_kid(),
        ttl_secs = settings.tokens.ttl_secs,
        "Configuration loaded successfully"
    );

    // Initialize email service
    let email_service =
        EmailService::new(&settings.email).context("Failed to initialize email service")?;
    if email_service.is_enabled() {
        info!("Email service initialized with SMTP transport");
    }

    let well_known = WellKnownDocuments::load(&settings.well_known)
        .context("Failed to load well-known documents")?;

    let state = Arc::new(AppState::new(
        &settings,
        Arc::new(email_service),
        well_known,
    ));

    start_http_server(
        state,
        &settings.server.host,
        settings.server.port,
        shutdown_signal(),
    )
    .await
    .context("HTTP server error")?;

    info!("Token service shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
