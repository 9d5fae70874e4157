//! Vault contract constants
//!
//! Entry point names and read-only call settings.

/// Contract entry points
pub mod functions {
    /// `deposit(from: Address, amount: i128)`
    pub const DEPOSIT: &str = "deposit";
    /// `withdraw(from: Address, shares: i128)`
    pub const WITHDRAW: &str = "withdraw";
    pub const TOTAL_ASSETS: &str = "total_assets";
    pub const TOTAL_SHARES: &str = "total_shares";
    /// `balance(user: Address) -> i128`, in shares
    pub const BALANCE: &str = "balance";
}

/// Source account for read-only simulations when no wallet is connected.
/// Simulation does not check the source's sequence or signature.
pub const READ_ONLY_SOURCE: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Default number of history rows
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Largest page Horizon serves
pub const MAX_HISTORY_LIMIT: u32 = 200;
