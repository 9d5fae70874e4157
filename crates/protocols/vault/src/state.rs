//! Vault State Types
//!
//! Metrics snapshots, history rows, actions and errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xhedge_core::constants::ASSET_SYMBOL;
use xhedge_core::{Stroops, TxError};

use crate::calculator;
use crate::constants::functions;

/// Snapshot of the vault as shown on the dashboard.
///
/// Integer quantities are stroop strings; `share_price` is a 7-decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultMetrics {
    pub total_assets: String,
    pub total_shares: String,
    pub share_price: String,
    pub user_balance: String,
    pub user_shares: String,
    pub asset_symbol: String,
}

impl VaultMetrics {
    /// Derive the display snapshot from raw contract reads
    pub fn from_raw(
        total_assets: Stroops,
        total_shares: Stroops,
        user_shares: Option<Stroops>,
    ) -> Result<Self, VaultError> {
        let user_shares = user_shares.unwrap_or(0);
        let user_balance = calculator::convert_to_assets(user_shares, total_assets, total_shares)
            .ok_or_else(|| {
                VaultError::InvalidState(format!(
                    "cannot value {} shares against {}/{}",
                    user_shares, total_assets, total_shares
                ))
            })?;

        Ok(Self {
            total_assets: total_assets.to_string(),
            total_shares: total_shares.to_string(),
            share_price: calculator::share_price(total_assets, total_shares),
            user_balance: user_balance.to_string(),
            user_shares: user_shares.to_string(),
            asset_symbol: ASSET_SYMBOL.to_string(),
        })
    }
}

impl Default for VaultMetrics {
    /// Empty vault, no user
    fn default() -> Self {
        Self {
            total_assets: "0".to_string(),
            total_shares: "0".to_string(),
            share_price: calculator::share_price(0, 0),
            user_balance: "0".to_string(),
            user_shares: "0".to_string(),
            asset_symbol: ASSET_SYMBOL.to_string(),
        }
    }
}

/// User-initiated vault action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultAction {
    Deposit,
    Withdraw,
}

impl VaultAction {
    /// Contract entry point invoked for this action
    pub fn function(&self) -> &'static str {
        match self {
            Self::Deposit => functions::DEPOSIT,
            Self::Withdraw => functions::WITHDRAW,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for VaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultAction {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            functions::DEPOSIT => Ok(Self::Deposit),
            functions::WITHDRAW => Ok(Self::Withdraw),
            other => Err(VaultError::InvalidState(format!(
                "not a vault action: {}",
                other
            ))),
        }
    }
}

/// Outcome of a historical transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

/// One row of vault history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransaction {
    pub hash: String,
    pub kind: VaultAction,
    /// 7-decimal display amount
    pub amount: String,
    pub asset: String,
    /// RFC 3339 timestamp as reported by Horizon
    pub date: String,
    pub status: TxStatus,
}

/// Vault read errors
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract read failed: {0}")]
    Read(String),

    #[error("Unexpected contract state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Transaction(#[from] TxError),
}

impl From<xhedge_core::RpcError> for VaultError {
    fn from(e: xhedge_core::RpcError) -> Self {
        Self::Rpc(e.to_string())
    }
}
