//! soroban-tx: Transaction building utilities for Soroban contract calls
//!
//! Provides fixed-point amount conversion, address and SCVal helpers, and
//! the build and assemble steps for contract invocation envelopes. XDR types
//! come from `stellar-xdr`.

pub mod address;
pub mod amount;
pub mod assemble;
pub mod builder;
pub mod envelope;
pub mod scval;

pub use address::{
    account_address, account_key, contract_address, contract_hash, muxed_account, AddressError,
};
pub use amount::{to_display, to_stroops, AmountError};
pub use assemble::{assemble, AssembleError, HostFunctionResult, SimulationResult};
pub use builder::{build_amount_call, build_invoke_tx, BuildError, InvokeBuildResult, InvokeSummary};
pub use envelope::{network_id, InvokeContractTx};
pub use scval::{
    decode_sc_val_base64, encode_sc_val_base64, i128_val, symbol, symbol_val, val_as_i128,
    val_as_symbol, XdrError,
};
pub use stellar_xdr::curr::{ScAddress, ScVal};
