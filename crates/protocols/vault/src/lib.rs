//! XHedge Vault Protocol
//!
//! The vault takes USDC deposits and issues shares priced at
//! `total_assets / total_shares`. This crate reads the vault's state, lists
//! a user's past vault calls and drives deposit/withdraw transactions from
//! user input to a submitted hash.

pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod history;
pub mod pipeline;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use calculator::{convert_to_assets, convert_to_shares, share_price, share_price_stroops};
pub use constants::{functions, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, READ_ONLY_SOURCE};
pub use fetch::{fetch_metrics, read_i128};
pub use history::{fetch_history, parse_history};
pub use pipeline::{
    unix_now, Pipeline, PipelineFailure, PipelineState, PipelineSuccess, Stage,
};
pub use state::{TxStatus, VaultAction, VaultError, VaultMetrics, VaultTransaction};
