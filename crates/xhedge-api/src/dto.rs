//! Data Transfer Objects for API requests and responses

use serde::{Deserialize, Serialize};
use soroban_tx::to_display;
use vault::{PipelineFailure, PipelineSuccess};
use xhedge_core::{Network, TxError};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: Network,
}

impl HealthResponse {
    pub fn new(network: Network) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            network,
        }
    }
}

/// Active network and its endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub network: Network,
    pub horizon_url: String,
    pub rpc_url: String,
    pub passphrase: String,
}

impl From<Network> for NetworkResponse {
    fn from(network: Network) -> Self {
        let endpoints = network.endpoints();
        Self {
            network,
            horizon_url: endpoints.horizon_url.to_string(),
            rpc_url: endpoints.rpc_url.to_string(),
            passphrase: endpoints.passphrase.to_string(),
        }
    }
}

/// Network change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRequest {
    pub network: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

/// Deposit or withdraw request; `amount` is the raw input string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultActionRequest {
    pub amount: String,
}

/// Accepted vault transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultActionResponse {
    pub hash: String,
    pub action: String,
    /// 7-decimal display amount
    pub amount: String,
    /// Total fee in stroops
    pub fee: u32,
    /// The input field may be cleared; only set on success
    pub clear_amount: bool,
}

impl From<&PipelineSuccess> for VaultActionResponse {
    fn from(success: &PipelineSuccess) -> Self {
        Self {
            hash: success.hash.to_string(),
            action: success.action.to_string(),
            amount: to_display(success.amount),
            fee: success.fee,
            clear_amount: true,
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Pipeline stage that failed, for vault actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            stage: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("network_unavailable", message)
    }
}

impl From<&TxError> for ApiError {
    fn from(e: &TxError) -> Self {
        Self::new(e.error_code(), e.reason())
    }
}

impl From<&PipelineFailure> for ApiError {
    fn from(failure: &PipelineFailure) -> Self {
        Self {
            stage: Some(failure.stage.to_string()),
            ..Self::from(&failure.error)
        }
    }
}
