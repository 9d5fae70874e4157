//! RPC health detection
//!
//! Probes `getHealth` and `getLatestLedger` and classifies the endpoint.

use serde::{Deserialize, Serialize};
use xhedge_core::Network;

use crate::RpcClient;

/// Health tier based on probe results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HealthTier {
    /// Reachable and reports `healthy`
    Healthy,
    /// Reachable but lagging or reporting another status
    Degraded,
    /// Not reachable
    Offline,
}

impl HealthTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Offline => "Offline",
        }
    }
}

/// Result of probing the network's RPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcStatus {
    pub network: Network,
    pub url: String,
    pub is_online: bool,
    pub health: Option<String>,
    pub latest_ledger: Option<u64>,
    pub protocol_version: Option<u64>,
    pub tier: HealthTier,
    pub latency_ms: u64,
}

impl RpcStatus {
    fn classify(health: Option<&str>, latest_ledger: Option<u64>) -> HealthTier {
        match (health, latest_ledger) {
            (None, None) => HealthTier::Offline,
            (Some("healthy"), Some(_)) => HealthTier::Healthy,
            _ => HealthTier::Degraded,
        }
    }
}

/// Probe the client's RPC endpoint. Never fails; failures show up in the tier.
pub async fn probe_rpc(client: &RpcClient) -> RpcStatus {
    let start = std::time::Instant::now();

    let health = match client.get_health().await {
        Ok(h) => Some(h),
        Err(e) => {
            tracing::debug!(url = %client.rpc_url(), error = %e, "getHealth failed");
            None
        }
    };

    let (latest_ledger, protocol_version) = match client.get_latest_ledger().await {
        Ok((seq, proto)) => (Some(seq), Some(proto)),
        Err(e) => {
            tracing::debug!(url = %client.rpc_url(), error = %e, "getLatestLedger failed");
            (None, None)
        }
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    let tier = RpcStatus::classify(health.as_deref(), latest_ledger);

    RpcStatus {
        network: client.network(),
        url: client.rpc_url().to_string(),
        is_online: tier != HealthTier::Offline,
        health,
        latest_ledger,
        protocol_version,
        tier,
        latency_ms,
    }
}
