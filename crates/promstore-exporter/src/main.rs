//! promstore exporter
//!
//! - Config: `PROMSTORE_CONFIG` (default `promstore.yaml`)
//! - Store lifecycle: open (hydrate) at start, close (persist) after graceful shutdown
//! - Ctrl-C flips readiness to draining, then the server stops

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use promstore_core::error::{Result, StoreError};
use promstore_exporter::{app_state::AppState, config, router};

const CONFIG_ENV: &str = "PROMSTORE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "promstore.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "promstore-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.exporter.listen_addr()?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| StoreError::Internal(format!("bind {listen} failed: {e}")))?;
    let storage = &state.cfg().storage;
    tracing::info!(
        %listen,
        persist = storage.persist,
        state_file = %storage.state_file,
        "promstore-exporter starting"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|e| StoreError::Internal(format!("server failed: {e}")));

    // persist even when the server loop failed
    let closed = state.shutdown();
    tracing::info!("promstore-exporter stopped");
    served.and(closed)
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining");
    state.set_draining();
}
