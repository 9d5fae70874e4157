//! Horizon response parsing
//!
//! Only the account and operations resources are read. Parsing is kept
//! separate from transport so it can be checked against captured payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use xhedge_core::{Address, RpcError};

use crate::{AccountState, Result};

/// One `invoke_host_function` parameter: base64 `SCVal` plus its type name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostParameter {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Operation record from `/accounts/{id}/operations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
    pub transaction_hash: String,
    #[serde(default = "default_true")]
    pub transaction_successful: bool,
    #[serde(default)]
    pub source_account: Option<String>,
    /// Host function type, only on `invoke_host_function`
    #[serde(default)]
    pub function: Option<String>,
    /// Contract address, function symbol, then call arguments
    #[serde(default)]
    pub parameters: Vec<HostParameter>,
}

fn default_true() -> bool {
    true
}

impl OperationRecord {
    pub fn is_contract_call(&self) -> bool {
        self.kind == "invoke_host_function"
            && self
                .function
                .as_deref()
                .is_some_and(|f| f.ends_with("InvokeContract"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationsPage {
    pub records: Vec<OperationRecord>,
}

pub(crate) fn parse_account(address: &Address, body: &Value) -> Result<AccountState> {
    let sequence = body["sequence"]
        .as_str()
        .ok_or_else(|| RpcError::ParseError("account: missing sequence".into()))?
        .parse::<i64>()
        .map_err(|e| RpcError::ParseError(format!("account sequence: {}", e)))?;

    let account_id = body["account_id"]
        .as_str()
        .map(Address::new)
        .unwrap_or_else(|| address.clone());

    Ok(AccountState {
        account_id,
        sequence,
    })
}

pub fn parse_operations(body: &Value) -> Result<OperationsPage> {
    let records = body["_embedded"]["records"]
        .as_array()
        .ok_or_else(|| RpcError::ParseError("operations: missing _embedded.records".into()))?;

    // Unknown operation shapes are skipped, not fatal
    let records = records
        .iter()
        .filter_map(|r| match serde_json::from_value::<OperationRecord>(r.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparseable operation record");
                None
            }
        })
        .collect();

    Ok(OperationsPage { records })
}

/// Horizon problem+json detail, falling back to the status code
pub(crate) fn problem_detail(body: &Value, status: u16) -> String {
    let title = body["title"].as_str();
    let detail = body["detail"].as_str();
    match (title, detail) {
        (Some(t), Some(d)) => format!("{} ({}): {}", t, status, d),
        (Some(t), None) => format!("{} ({})", t, status),
        _ => format!("Horizon returned HTTP {}", status),
    }
}
