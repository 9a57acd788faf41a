//! # Shepherd API Server
//!
//! Loads configuration, opens the database and serves the router until
//! Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use shepherd_api::{router, ApiConfig, AppState};
use shepherd_commerce::PaystackGateway;
use shepherd_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shepherd=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    info!("Starting Shepherd API server...");

    // Load configuration
    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        port = config.port,
        database = %config.database_path.display(),
        paystack = %config.paystack_base_url,
        require_webhook_signature = config.require_webhook_signature,
        "Configuration loaded"
    );
    if config.paystack_secret_key.is_none() {
        warn!("PAYSTACK_SECRET_KEY not set; payment initiation and webhooks will be refused");
    }

    // Open database (runs migrations)
    let db = Database::new(DbConfig::new(config.database_path.clone()))
        .await
        .context("opening database")?;

    let gateway = PaystackGateway::new(config.gateway()).context("building Paystack client")?;
    let state = AppState::new(db.clone(), Arc::new(gateway), config.reconciliation());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
