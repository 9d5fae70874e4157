//! XHedge local backend
//!
//! Starts the wallet relay and the dashboard API, wires them to shared
//! state and runs until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use wallet_relay::{RelaySigner, WalletRelay, REQUEST_TTL};
use xhedge_api::{start_server, AppState};
use xhedge_core::AppConfig;

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "xhedge=debug,vault=debug,wallet_relay=debug,info";

/// Install the global tracing subscriber
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the backend until Ctrl-C
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        contract = %config.contract_id,
        network = %config.network,
        "Starting XHedge backend"
    );

    let relay = WalletRelay::start_on_port(config.relay_port, REQUEST_TTL)
        .await
        .with_context(|| format!("failed to start wallet relay on port {}", config.relay_port))?;
    tracing::info!("Wallet relay at {}", relay.base_url());

    let signer = RelaySigner::new(Arc::new(relay));
    let state = AppState::new(config.clone(), signer);

    // Resolve the wallet session without holding up the API
    tokio::spawn({
        let state = state.clone();
        async move {
            let session = state.probe_wallet().await;
            tracing::debug!(connected = session.connected, "Initial wallet probe done");
        }
    });

    start_server(state, config.api_port, shutdown_signal())
        .await
        .with_context(|| format!("API server on port {} failed", config.api_port))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
