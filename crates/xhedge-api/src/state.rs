//! Application state shared across API handlers
//!
//! One writer per change, many readers: each field sits behind its own lock
//! and every mutation goes through a method here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use soroban_rpc_client::RpcClient;
use thiserror::Error;
use tokio::sync::RwLock;
use vault::{fetch_metrics, PipelineState, VaultError, VaultMetrics};
use wallet_relay::RelaySigner;
use xhedge_core::{AppConfig, Network, RpcError, WalletError, WalletSession, WalletSigner};

use crate::preferences::{Preferences, PreferencesError};

/// Errors that can occur in the API layer
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Preferences(#[from] PreferencesError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Network or wallet changed while metrics were being read")]
    Superseded,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    network: RwLock<Network>,
    rpc_clients: RwLock<HashMap<Network, Arc<RpcClient>>>,
    wallet: RwLock<WalletSession>,
    metrics: RwLock<Option<VaultMetrics>>,
    // Bumped whenever the cached snapshot stops matching (network, user)
    metrics_epoch: AtomicU64,
    pipeline_busy: AtomicBool,
    // Written from the pipeline observer, which is synchronous
    pipeline_state: Mutex<PipelineState>,
    signer: RelaySigner,
    preferences: Preferences,
}

/// Marks a pipeline run in flight until dropped
pub struct PipelineGuard {
    state: AppState,
}

impl Drop for PipelineGuard {
    fn drop(&mut self) {
        self.state.inner.pipeline_busy.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    /// Build state from config; the stored network preference wins over
    /// the configured default.
    pub fn new(config: AppConfig, signer: RelaySigner) -> Self {
        let preferences = Preferences::new(&config.data_dir);
        let network = preferences.load_network().unwrap_or(config.network);
        tracing::info!(network = %network, "Active network");

        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                network: RwLock::new(network),
                rpc_clients: RwLock::new(HashMap::new()),
                wallet: RwLock::new(WalletSession::default()),
                metrics: RwLock::new(None),
                metrics_epoch: AtomicU64::new(0),
                pipeline_busy: AtomicBool::new(false),
                pipeline_state: Mutex::new(PipelineState::Idle),
                signer,
                preferences,
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Get current network
    pub async fn network(&self) -> Network {
        *self.inner.network.read().await
    }

    /// Persist the choice, then switch networks. Cached metrics belong to
    /// the old network and are dropped. Nothing changes if saving fails.
    pub async fn set_network(&self, network: Network) -> Result<(), StateError> {
        {
            let mut current = self.inner.network.write().await;
            if *current == network {
                return Ok(());
            }
            self.inner.preferences.save_network(network)?;
            *current = network;
        }
        self.clear_metrics().await;
        tracing::info!(network = %network, "Network changed");
        Ok(())
    }

    /// Get or create the RPC client for the active network
    pub async fn rpc_client(&self) -> Result<Arc<RpcClient>, RpcError> {
        let network = self.network().await;

        if let Some(client) = self.inner.rpc_clients.read().await.get(&network) {
            return Ok(client.clone());
        }

        let mut clients = self.inner.rpc_clients.write().await;
        // Double-check after acquiring write lock
        if let Some(client) = clients.get(&network) {
            return Ok(client.clone());
        }

        let config = self.inner.config.read().await;
        let client = Arc::new(RpcClient::new(network, &config.rpc)?);
        tracing::info!(network = %network, url = %client.rpc_url(), "Created RPC client");
        clients.insert(network, client.clone());
        Ok(client)
    }

    /// Replace the cached client for a network (custom endpoints)
    pub async fn set_rpc_client(&self, client: RpcClient) {
        let network = client.network();
        self.inner
            .rpc_clients
            .write()
            .await
            .insert(network, Arc::new(client));
    }

    pub fn signer(&self) -> &RelaySigner {
        &self.inner.signer
    }

    /// Get current wallet session
    pub async fn wallet(&self) -> WalletSession {
        self.inner.wallet.read().await.clone()
    }

    async fn update_wallet(&self, f: impl FnOnce(&mut WalletSession)) -> WalletSession {
        let mut wallet = self.inner.wallet.write().await;
        f(&mut wallet);
        wallet.clone()
    }

    /// Resolve the session from the wallet probe, reconnecting silently when
    /// access was granted before.
    pub async fn probe_wallet(&self) -> WalletSession {
        self.update_wallet(WalletSession::begin).await;
        let signer = self.signer();

        let probe = match signer.probe().await {
            Ok(probe) => probe,
            Err(e) => return self.update_wallet(|w| w.failed(e.to_string())).await,
        };

        if probe.previously_authorized {
            match signer.public_key().await {
                Ok(key) => {
                    tracing::info!(public_key = %key, "Wallet reconnected");
                    return self.update_wallet(|w| w.connected(key)).await;
                }
                Err(e) => {
                    tracing::debug!("Previously authorized wallet has no key: {}", e);
                }
            }
        }

        if probe.extension_present {
            self.update_wallet(WalletSession::installed_idle).await
        } else {
            self.update_wallet(WalletSession::not_installed).await
        }
    }

    /// Ask the user for access. Resolves once a relay page answers or the
    /// request expires.
    pub async fn connect_wallet(&self) -> WalletSession {
        self.update_wallet(WalletSession::begin).await;

        let session = match self.signer().request_access().await {
            Ok(key) => {
                tracing::info!(public_key = %key, "Wallet connected");
                self.update_wallet(|w| w.connected(key)).await
            }
            Err(WalletError::ExtensionMissing) => {
                let message = WalletError::ExtensionMissing.to_string();
                self.update_wallet(|w| {
                    w.not_installed();
                    w.failed(message);
                })
                .await
            }
            Err(e) => {
                tracing::warn!("Wallet connection failed: {}", e);
                self.update_wallet(|w| w.failed(e.to_string())).await
            }
        };

        self.clear_metrics().await;
        session
    }

    pub async fn disconnect_wallet(&self) -> WalletSession {
        let session = self.update_wallet(WalletSession::disconnected).await;
        self.clear_metrics().await;
        tracing::info!("Wallet disconnected");
        session
    }

    /// Last metrics snapshot, if any
    pub async fn metrics(&self) -> Option<VaultMetrics> {
        self.inner.metrics.read().await.clone()
    }

    async fn clear_metrics(&self) {
        let mut metrics = self.inner.metrics.write().await;
        self.inner.metrics_epoch.fetch_add(1, Ordering::SeqCst);
        *metrics = None;
    }

    fn metrics_epoch(&self) -> u64 {
        self.inner.metrics_epoch.load(Ordering::SeqCst)
    }

    /// Store a snapshot read during `epoch`. Refused once the network or
    /// wallet has changed since.
    async fn commit_metrics(&self, epoch: u64, metrics: VaultMetrics) -> bool {
        let mut current = self.inner.metrics.write().await;
        if self.metrics_epoch() != epoch {
            return false;
        }
        *current = Some(metrics);
        true
    }

    /// Read fresh metrics for the connected user and replace the snapshot
    pub async fn refresh_metrics(&self) -> Result<VaultMetrics, StateError> {
        // Taken before the inputs so a concurrent change is always noticed
        let epoch = self.metrics_epoch();
        let client = self.rpc_client().await?;
        let contract_id = self.inner.config.read().await.contract_id.clone();
        let user = self.wallet().await.address().cloned();

        let metrics = fetch_metrics(client.as_ref(), &contract_id, user.as_ref()).await?;
        if !self.commit_metrics(epoch, metrics.clone()).await {
            tracing::debug!(network = %client.network(), "Discarding superseded metrics");
            return Err(StateError::Superseded);
        }
        Ok(metrics)
    }

    /// Claim the single pipeline slot; `None` while a run is in flight
    pub fn try_begin_pipeline(&self) -> Option<PipelineGuard> {
        self.inner
            .pipeline_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PipelineGuard {
                state: self.clone(),
            })
    }

    pub fn pipeline_state(&self) -> PipelineState {
        match self.inner.pipeline_state.lock() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_pipeline_state(&self, state: PipelineState) {
        match self.inner.pipeline_state.lock() {
            Ok(mut current) => *current = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use wallet_relay::{ServerState, WalletRelay, REQUEST_TTL};
    use xhedge_core::{Address, RpcConfig};

    pub const KEY: &str = "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX";

    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xhedge-state-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    /// State over a detached relay and an unreachable RPC endpoint
    pub async fn test_state(name: &str) -> AppState {
        let relay = WalletRelay::detached(Arc::new(ServerState::new("127.0.0.1", 4000, REQUEST_TTL)));
        let signer = RelaySigner::new(Arc::new(relay)).with_poll_interval(Duration::from_millis(5));
        let config = AppConfig {
            data_dir: scratch_dir(name),
            ..AppConfig::default()
        };
        let state = AppState::new(config, signer);

        let rpc = RpcConfig { timeout_secs: 1 };
        for network in Network::ALL {
            let client =
                RpcClient::with_urls(network, "http://127.0.0.1:9", "http://127.0.0.1:9", &rpc)
                    .unwrap();
            state.set_rpc_client(client).await;
        }
        state
    }

    /// Pretend a relay page already granted access
    pub async fn authorize(state: &AppState) {
        let relay_state = state.signer().relay().state();
        let mut wallet = relay_state.wallet.write().await;
        wallet.extension_present = true;
        wallet.authorized_key = Some(Address::new(KEY));
    }

    #[tokio::test]
    async fn test_network_change_is_persisted() {
        let state = test_state("network").await;
        assert_eq!(state.network().await, Network::Testnet);

        state.set_network(Network::Futurenet).await.unwrap();
        assert_eq!(state.network().await, Network::Futurenet);

        let config = state.config().await;
        let prefs = Preferences::new(&config.data_dir);
        assert_eq!(prefs.load_network(), Some(Network::Futurenet));

        // A new state over the same data dir starts on the stored network
        let signer = state.signer().clone();
        let restarted = AppState::new(config.clone(), signer);
        assert_eq!(restarted.network().await, Network::Futurenet);

        let _ = std::fs::remove_dir_all(&config.data_dir);
    }

    #[tokio::test]
    async fn test_rpc_client_is_cached_per_network() {
        let state = test_state("clients").await;
        let a = state.rpc_client().await.unwrap();
        let b = state.rpc_client().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.network(), Network::Testnet);
    }

    #[tokio::test]
    async fn test_probe_without_reports() {
        let state = test_state("probe-empty").await;
        assert!(state.wallet().await.loading);

        let session = state.probe_wallet().await;
        assert!(!session.loading);
        assert!(!session.installed);
        assert!(!session.connected);
    }

    #[tokio::test]
    async fn test_probe_reconnects_authorized_wallet() {
        let state = test_state("probe-auth").await;
        authorize(&state).await;

        let session = state.probe_wallet().await;
        assert!(session.connected);
        assert_eq!(session.address(), Some(&Address::new(KEY)));

        let session = state.disconnect_wallet().await;
        assert!(session.installed);
        assert!(!session.connected);
    }

    #[tokio::test]
    async fn test_pipeline_slot_is_exclusive() {
        let state = test_state("slot").await;
        let guard = state.try_begin_pipeline().unwrap();
        assert!(state.try_begin_pipeline().is_none());
        drop(guard);
        assert!(state.try_begin_pipeline().is_some());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_network() {
        let state = test_state("network-readonly").await;
        let config = state.config().await;
        // A file where the data directory should be makes every save fail
        std::fs::write(&config.data_dir, b"").unwrap();

        let err = state.set_network(Network::Mainnet).await.unwrap_err();
        assert!(matches!(err, StateError::Preferences(_)));
        assert_eq!(state.network().await, Network::Testnet);
        assert_eq!(state.rpc_client().await.unwrap().network(), Network::Testnet);

        let _ = std::fs::remove_file(&config.data_dir);
    }

    fn snapshot() -> VaultMetrics {
        VaultMetrics::from_raw(10_000_000, 10_000_000, None).unwrap()
    }

    #[tokio::test]
    async fn test_superseded_metrics_are_not_stored() {
        let state = test_state("metrics-epoch").await;

        let epoch = state.metrics_epoch();
        assert!(state.commit_metrics(epoch, snapshot()).await);
        assert!(state.metrics().await.is_some());

        // a read started before a network switch or disconnect lands after it
        let epoch = state.metrics_epoch();
        state.set_network(Network::Futurenet).await.unwrap();
        assert!(state.metrics().await.is_none());
        assert!(!state.commit_metrics(epoch, snapshot()).await);
        assert!(state.metrics().await.is_none());

        let epoch = state.metrics_epoch();
        state.disconnect_wallet().await;
        assert!(!state.commit_metrics(epoch, snapshot()).await);
        assert!(state.metrics().await.is_none());

        let _ = std::fs::remove_dir_all(&state.config().await.data_dir);
    }

    #[tokio::test]
    async fn test_refresh_metrics_unreachable() {
        let state = test_state("metrics").await;
        let err = state.refresh_metrics().await.unwrap_err();
        assert!(matches!(err, StateError::Vault(VaultError::Rpc(_))));
        assert!(state.metrics().await.is_none());
    }
}
