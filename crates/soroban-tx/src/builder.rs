//! Contract invocation builder
//!
//! Pure: the caller supplies the account sequence and the clock, so the
//! same inputs always yield the same envelope.

use stellar_xdr::curr::{InvokeContractArgs, ScVal};
use xhedge_core::constants::{BASE_FEE, TX_VALIDITY_SECS};
use xhedge_core::{Address, ContractId, Stroops, TxError};

use crate::address::{account_address, contract_address, muxed_account, AddressError};
use crate::amount::AmountError;
use crate::envelope::InvokeContractTx;
use crate::scval::{i128_val, symbol, val_as_i128, XdrError};

/// Result of building an invocation
#[derive(Debug)]
pub struct InvokeBuildResult {
    pub unsigned_tx: InvokeContractTx,
    pub summary: InvokeSummary,
}

/// What the invocation does, for logging and display
#[derive(Debug, Clone)]
pub struct InvokeSummary {
    pub contract_id: ContractId,
    pub function: String,
    pub source: Address,
    pub amount: Option<Stroops>,
    pub fee: u32,
    pub valid_until: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("Sequence number overflow")]
    SequenceOverflow,

    #[error("Transaction encoding failed: {0}")]
    Encoding(#[from] XdrError),
}

impl From<BuildError> for TxError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::Address(e) => e.into(),
            other => TxError::InvalidAmount {
                message: other.to_string(),
            },
        }
    }
}

/// Build an unsigned invocation of `function(args...)` on `contract_id`.
///
/// `account_sequence` is the source account's current sequence; the envelope
/// uses the next one. The validity window runs from `now` for
/// `TX_VALIDITY_SECS`.
pub fn build_invoke_tx(
    contract_id: &ContractId,
    function: &str,
    source: &Address,
    args: Vec<ScVal>,
    account_sequence: i64,
    now: u64,
) -> Result<InvokeBuildResult, BuildError> {
    let source_account = muxed_account(source)?;
    let sequence = account_sequence
        .checked_add(1)
        .ok_or(BuildError::SequenceOverflow)?;
    let valid_until = now + TX_VALIDITY_SECS;

    let amount = args.iter().rev().find_map(|a| match a {
        ScVal::I128(_) => val_as_i128(a),
        _ => None,
    });

    let invocation = InvokeContractArgs {
        contract_address: contract_address(contract_id)?,
        function_name: symbol(function)?,
        args: args.try_into()?,
    };
    let unsigned_tx =
        InvokeContractTx::new(source_account, BASE_FEE, sequence, valid_until, invocation);

    Ok(InvokeBuildResult {
        unsigned_tx,
        summary: InvokeSummary {
            contract_id: contract_id.clone(),
            function: function.to_string(),
            source: source.clone(),
            amount,
            fee: BASE_FEE,
            valid_until,
        },
    })
}

/// Build `function(user, amount)`, the shape of the vault's deposit and
/// withdraw entry points.
pub fn build_amount_call(
    contract_id: &ContractId,
    function: &str,
    user: &Address,
    amount: Stroops,
    account_sequence: i64,
    now: u64,
) -> Result<InvokeBuildResult, BuildError> {
    if amount <= 0 {
        return Err(BuildError::NonPositiveAmount);
    }
    let args = vec![ScVal::Address(account_address(user)?), i128_val(amount)];
    build_invoke_tx(contract_id, function, user, args, account_sequence, now)
}
