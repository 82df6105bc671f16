//! Catalog-BOT metrics gateway.
//!
//! - Dashboard endpoint: GET /portal-metrics (snapshot JSON)
//! - Ingest endpoint: POST /portal-metrics/events
//! - Ops: /healthz, /readyz, /metrics
//! - Snapshot poller logging a summary every `metrics.poll_interval_ms`

use std::net::SocketAddr;

use tokio::sync::watch;
use tokio::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use catalogbot_core::error::{CatalogBotError, Result};
use catalogbot_gateway::{app_state::AppState, config, obs::poller, router};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "catalogbot-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| CatalogBotError::BadRequest(format!("gateway.listen: {e}")))?;
    let poll_every = Duration::from_millis(cfg.metrics.poll_interval_ms);

    let state = AppState::new(cfg)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let poller = poller::spawn(state.aggregator(), poll_every, stop_rx);

    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "catalogbot-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| CatalogBotError::Internal(format!("bind {listen} failed: {e}")))?;

    let drain_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            drain_state.set_draining();
            let _ = stop_tx.send(true);
        })
        .await
        .map_err(|e| CatalogBotError::Internal(format!("server failed: {e}")))?;

    let _ = poller.await;
    tracing::info!("catalogbot-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
