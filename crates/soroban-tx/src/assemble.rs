//! Apply a simulation result to an unsigned invocation

use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{
    Limits, ReadXdr, ScVal, SorobanAuthorizationEntry, SorobanTransactionData,
};
use xhedge_core::TxError;

use crate::envelope::InvokeContractTx;

/// `simulateTransaction` result payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    #[serde(default)]
    pub error: Option<String>,
    /// Base64 `SorobanTransactionData`
    #[serde(default)]
    pub transaction_data: Option<String>,
    /// Resource fee in stroops, as a decimal string
    #[serde(default)]
    pub min_resource_fee: Option<String>,
    #[serde(default)]
    pub results: Vec<HostFunctionResult>,
    /// Present when archived ledger entries must be restored first
    #[serde(default)]
    pub restore_preamble: Option<serde_json::Value>,
    #[serde(default)]
    pub latest_ledger: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFunctionResult {
    /// Base64 `SorobanAuthorizationEntry` values
    #[serde(default)]
    pub auth: Vec<String>,
    /// Base64 return `SCVal`
    #[serde(default)]
    pub xdr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    /// Host error reported by the simulator, kept as-is
    #[error("{0}")]
    Simulation(String),

    #[error("Simulation response is missing {0}")]
    MissingField(&'static str),

    #[error("Archived contract state must be restored before this call")]
    RestoreRequired,

    #[error("Malformed simulation {field}: {message}")]
    Malformed { field: &'static str, message: String },

    #[error("Fee overflow: base {base} + resource {resource}")]
    FeeOverflow { base: u32, resource: u64 },
}

impl From<AssembleError> for TxError {
    fn from(e: AssembleError) -> Self {
        TxError::SimulationFailed {
            message: e.to_string(),
        }
    }
}

fn decode<T: ReadXdr>(field: &'static str, encoded: &str) -> Result<T, AssembleError> {
    T::from_xdr_base64(encoded, Limits::none()).map_err(|e| AssembleError::Malformed {
        field,
        message: e.to_string(),
    })
}

impl SimulationResult {
    /// Reject responses that cannot be assembled
    pub fn check(&self) -> Result<(), AssembleError> {
        if let Some(error) = &self.error {
            return Err(AssembleError::Simulation(error.clone()));
        }
        if self.restore_preamble.is_some() {
            return Err(AssembleError::RestoreRequired);
        }
        if self.transaction_data.is_none() {
            return Err(AssembleError::MissingField("transactionData"));
        }
        if self.min_resource_fee.is_none() {
            return Err(AssembleError::MissingField("minResourceFee"));
        }
        Ok(())
    }

    pub fn resource_fee(&self) -> Result<u64, AssembleError> {
        let raw = self
            .min_resource_fee
            .as_deref()
            .ok_or(AssembleError::MissingField("minResourceFee"))?;
        raw.parse::<u64>().map_err(|e| AssembleError::Malformed {
            field: "minResourceFee",
            message: e.to_string(),
        })
    }

    /// Footprint and resources the transaction must declare
    pub fn soroban_data(&self) -> Result<SorobanTransactionData, AssembleError> {
        let data = self
            .transaction_data
            .as_deref()
            .ok_or(AssembleError::MissingField("transactionData"))?;
        decode("transactionData", data)
    }

    /// Authorization entries recorded for the invocation
    pub fn auth(&self) -> Result<Vec<SorobanAuthorizationEntry>, AssembleError> {
        match self.results.first() {
            Some(result) => result.auth.iter().map(|entry| decode("auth", entry)).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Decoded return value of the simulated call
    pub fn return_value(&self) -> Result<ScVal, AssembleError> {
        if let Some(error) = &self.error {
            return Err(AssembleError::Simulation(error.clone()));
        }
        let result = self
            .results
            .first()
            .ok_or(AssembleError::MissingField("results"))?;
        decode("results.xdr", &result.xdr)
    }
}

/// Attach resources, authorization and the resource fee to `tx`.
///
/// Resulting fee is `tx.fee + minResourceFee`. Any auth entries already on
/// the operation are replaced by the simulated ones.
pub fn assemble(
    tx: &InvokeContractTx,
    sim: &SimulationResult,
) -> Result<InvokeContractTx, AssembleError> {
    sim.check()?;

    let resource = sim.resource_fee()?;
    let soroban_data = sim.soroban_data()?;
    // The declared resource fee is charged out of the total fee
    if soroban_data.resource_fee < 0 || soroban_data.resource_fee as u64 > resource {
        return Err(AssembleError::Malformed {
            field: "transactionData",
            message: format!(
                "resource fee {} outside 0..={}",
                soroban_data.resource_fee, resource
            ),
        });
    }

    let fee = u32::try_from(resource)
        .ok()
        .and_then(|r| tx.fee.checked_add(r))
        .ok_or(AssembleError::FeeOverflow {
            base: tx.fee,
            resource,
        })?;

    Ok(InvokeContractTx {
        fee,
        auth: sim.auth()?,
        soroban_data: Some(soroban_data),
        ..tx.clone()
    })
}
