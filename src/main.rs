//! Resilient API - diagnostics server
//!
//! Builds the request orchestrator from the environment and serves its
//! health and cache controls over HTTP.
//!
//! This process issues no remote calls of its own. The router is meant to be
//! mounted next to the command layer that drives the orchestrator; standalone,
//! `/health` and `/stats` report a closed circuit and an empty cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resilient_api::api::{create_router, AppState};
use resilient_api::client::{EnvTokenProvider, ReqwestTransport, RequestOrchestrator};
use resilient_api::Config;

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build transport, credentials and the orchestrator
/// 4. Start the diagnostics HTTP server on the configured port
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resilient_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resilient API");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        base_url = %config.api.base_url,
        cache_enabled = config.cache.enabled,
        cache_max_size = config.cache.max_size,
        retry_max_attempts = config.retry.max_attempts,
        breaker_threshold = config.circuit_breaker.threshold,
        port = config.diagnostics_port,
        "Configuration loaded"
    );

    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    let orchestrator = RequestOrchestrator::from_config(
        &config,
        Arc::new(EnvTokenProvider::default()),
        Arc::new(transport),
    );
    info!("Request orchestrator initialized");

    let app = create_router(AppState::new(orchestrator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.diagnostics_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Diagnostics listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
