//! Vault Metrics Fetching
//!
//! Reads the vault's totals and the user's share balance by simulating the
//! contract's read-only entry points. Nothing is signed or submitted.

use soroban_rpc_client::ChainRpc;
use soroban_tx::{account_address, build_invoke_tx, val_as_i128, ScVal};
use xhedge_core::{Address, ContractId, Stroops, TxError};

use crate::constants::{functions, READ_ONLY_SOURCE};
use crate::pipeline::unix_now;
use crate::state::{VaultError, VaultMetrics};

/// Simulate `function(args)` and decode an integer return value
pub async fn read_i128<R: ChainRpc>(
    rpc: &R,
    contract_id: &ContractId,
    source: &Address,
    function: &str,
    args: Vec<ScVal>,
) -> Result<Stroops, VaultError> {
    let built = build_invoke_tx(contract_id, function, source, args, 0, unix_now())
        .map_err(|e| VaultError::Transaction(TxError::from(e)))?;
    let blob = built
        .unsigned_tx
        .to_blob()
        .map_err(|e| VaultError::Read(format!("{}: {}", function, e)))?;

    let sim = rpc.simulate(&blob).await?;
    let value = sim
        .return_value()
        .map_err(|e| VaultError::Read(format!("{}: {}", function, e)))?;

    val_as_i128(&value)
        .ok_or_else(|| VaultError::Read(format!("{} returned {:?}", function, value)))
}

/// Read totals and, when a user is given, their share balance
pub async fn fetch_metrics<R: ChainRpc>(
    rpc: &R,
    contract_id: &ContractId,
    user: Option<&Address>,
) -> Result<VaultMetrics, VaultError> {
    let read_only = Address::new(READ_ONLY_SOURCE);
    let source = user.unwrap_or(&read_only);

    let total_assets = read_i128(rpc, contract_id, source, functions::TOTAL_ASSETS, vec![]).await?;
    let total_shares = read_i128(rpc, contract_id, source, functions::TOTAL_SHARES, vec![]).await?;

    let user_shares = match user {
        Some(user) => {
            let address = account_address(user).map_err(|e| VaultError::Transaction(e.into()))?;
            let args = vec![ScVal::Address(address)];
            Some(read_i128(rpc, contract_id, source, functions::BALANCE, args).await?)
        }
        None => None,
    };

    let metrics = VaultMetrics::from_raw(total_assets, total_shares, user_shares)?;
    tracing::debug!(
        network = %rpc.network(),
        total_assets = %metrics.total_assets,
        total_shares = %metrics.total_shares,
        share_price = %metrics.share_price,
        "Fetched vault metrics"
    );
    Ok(metrics)
}
