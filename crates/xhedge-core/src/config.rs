//! Configuration types for XHedge

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{constants, ContractId, Network};

/// RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Per-call timeout for account, simulate and submit requests (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Vault contract the dashboard talks to
    pub contract_id: ContractId,

    /// Network used until the user picks one
    #[serde(default)]
    pub network: Network,

    /// RPC settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Wallet relay port (0 picks a free port)
    #[serde(default)]
    pub relay_port: u16,

    /// Directory holding persisted preferences
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_api_port() -> u16 {
    17070
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".xhedge")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            contract_id: ContractId::new(constants::DEFAULT_CONTRACT_ID),
            network: Network::default(),
            rpc: RpcConfig::default(),
            api_port: default_api_port(),
            relay_port: 0,
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `XHEDGE_*` environment variables
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Unparseable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(id) = lookup("XHEDGE_CONTRACT_ID").filter(|v| !v.trim().is_empty()) {
            self.contract_id = ContractId::new(id.trim());
        }
        if let Some(network) = lookup("XHEDGE_NETWORK").and_then(|v| v.parse().ok()) {
            self.network = network;
        }
        if let Some(port) = lookup("XHEDGE_API_PORT").and_then(|v| v.parse().ok()) {
            self.api_port = port;
        }
        if let Some(port) = lookup("XHEDGE_RELAY_PORT").and_then(|v| v.parse().ok()) {
            self.relay_port = port;
        }
        if let Some(secs) = lookup("XHEDGE_RPC_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.rpc.timeout_secs = secs;
        }
        if let Some(dir) = lookup("XHEDGE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}
