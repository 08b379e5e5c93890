use anyhow::Context;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use studio_api::config::{self, ProcessEnv};
use studio_api::database::{migrate, DatabaseManager};
use studio_api::notify::Notifier;
use studio_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up the database URL and secrets
    let _ = dotenvy::dotenv();
    studio_api::telemetry::init_tracing(false)?;

    let config = config::config().context("invalid configuration")?.clone();
    info!("Starting Studio API in {:?} mode", config.environment);

    let db = DatabaseManager::from_env(&ProcessEnv, &config.database)
        .await
        .context("failed to open database")?;
    migrate::ensure_schema(db.store())
        .await
        .context("failed to prepare schema")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("studio-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let (notifier, worker) = Notifier::spawn(&config.webhook, http.clone());

    let port = config.server.port;
    let state = AppState::new(db.clone(), config, notifier, http).context("invalid session configuration")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Studio API listening on http://{}", bind_addr);

    // Run with graceful shutdown; the router owns the last notifier clone
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(worker) = worker {
        if tokio::time::timeout(Duration::from_secs(5), worker).await.is_err() {
            warn!("Webhook worker did not drain within 5s");
        }
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
