//! Vault Transaction History
//!
//! Horizon lists every operation on the user's account. Vault calls are the
//! `invoke_host_function` records whose parameters start with the vault
//! contract address and a `deposit`/`withdraw` symbol:
//!
//! ```text
//! [contract: Address, function: Sym, from: Address, amount: I128]
//! ```

use soroban_rpc_client::{OperationRecord, RpcClient};
use soroban_tx::{
    contract_address, decode_sc_val_base64, to_display, val_as_i128, val_as_symbol, ScAddress, ScVal,
};
use xhedge_core::constants::ASSET_SYMBOL;
use xhedge_core::{Address, ContractId, RpcError};

use crate::constants::MAX_HISTORY_LIMIT;
use crate::state::{TxStatus, VaultAction, VaultError, VaultTransaction};

/// Decode a single record, `None` when it is not a call on `contract`
fn parse_record(record: &OperationRecord, contract: &ScAddress) -> Option<VaultTransaction> {
    if !record.is_contract_call() {
        return None;
    }

    let target = decode_sc_val_base64(&record.parameters.first()?.value).ok()?;
    match target {
        ScVal::Address(address) if &address == contract => {}
        _ => return None,
    }

    let function = decode_sc_val_base64(&record.parameters.get(1)?.value).ok()?;
    let kind: VaultAction = val_as_symbol(&function)?.parse().ok()?;

    let amount = val_as_i128(&decode_sc_val_base64(&record.parameters.get(3)?.value).ok()?)?;

    Some(VaultTransaction {
        hash: record.transaction_hash.clone(),
        kind,
        amount: to_display(amount),
        asset: ASSET_SYMBOL.to_string(),
        date: record.created_at.clone(),
        status: if record.transaction_successful {
            TxStatus::Success
        } else {
            TxStatus::Failed
        },
    })
}

/// Keep the vault calls among `records`, in feed order, at most `limit`
pub fn parse_history(
    records: &[OperationRecord],
    contract_id: &ContractId,
    limit: usize,
) -> Result<Vec<VaultTransaction>, VaultError> {
    let contract =
        contract_address(contract_id).map_err(|e| VaultError::Transaction(e.into()))?;

    Ok(records
        .iter()
        .filter_map(|r| parse_record(r, &contract))
        .take(limit)
        .collect())
}

/// Most recent vault calls made by `user`, newest first.
///
/// An account that does not exist yet has no history.
pub async fn fetch_history(
    rpc: &RpcClient,
    user: &Address,
    contract_id: &ContractId,
    limit: u32,
) -> Result<Vec<VaultTransaction>, VaultError> {
    // Vault calls are a subset of the feed, so read a full page
    let page = match rpc.account_operations(user, MAX_HISTORY_LIMIT).await {
        Ok(page) => page,
        Err(RpcError::AccountNotFound { .. }) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let history = parse_history(&page.records, contract_id, limit as usize)?;
    tracing::debug!(
        user = %user,
        scanned = page.records.len(),
        found = history.len(),
        "Fetched vault history"
    );
    Ok(history)
}
