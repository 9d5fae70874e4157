//! Error types for XHedge

use thiserror::Error;

/// Core errors that can occur in XHedge
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// RPC and account-endpoint errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Endpoint unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Endpoint returned error: {message}")]
    ApiError { message: String },

    /// JSON-RPC `error` object returned for a call
    #[error("{method} failed ({code}): {message}")]
    Rejected {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Account not found: {address}")]
    AccountNotFound { address: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Wallet capability errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Freighter extension not found. Please install it.")]
    ExtensionMissing,

    #[error("Wallet not connected")]
    NotConnected,

    #[error("{reason}")]
    Declined { reason: String },

    #[error("Wallet request expired")]
    Expired,

    #[error("Wallet relay error: {message}")]
    Relay { message: String },
}

/// Transaction pipeline errors
///
/// All variants are terminal for the pipeline run that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Account not found: {address}")]
    AccountNotFound { address: String },

    #[error("Network unavailable: {message}")]
    NetworkUnavailable { message: String },

    #[error("Simulation failed: {message}")]
    SimulationFailed { message: String },

    #[error("Signing declined: {message}")]
    SigningDeclined { message: String },

    #[error("Submission rejected: {reason}")]
    SubmissionRejected { reason: String },
}

/// Result type alias for XHedge operations
pub type Result<T> = std::result::Result<T, Error>;

impl TxError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::WalletNotConnected => "wallet_not_connected",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::NetworkUnavailable { .. } => "network_unavailable",
            Self::SimulationFailed { .. } => "simulation_failed",
            Self::SigningDeclined { .. } => "signing_declined",
            Self::SubmissionRejected { .. } => "submission_rejected",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidAddress { .. } => 400,
            Self::WalletNotConnected => 401,
            Self::AccountNotFound { .. } => 404,
            Self::SimulationFailed { .. }
            | Self::SigningDeclined { .. }
            | Self::SubmissionRejected { .. } => 422,
            Self::NetworkUnavailable { .. } => 503,
        }
    }

    /// The raw reason string shown to the user, without the category prefix
    pub fn reason(&self) -> String {
        match self {
            Self::InvalidAmount { message }
            | Self::NetworkUnavailable { message }
            | Self::SimulationFailed { message }
            | Self::SigningDeclined { message } => message.clone(),
            Self::InvalidAddress { address, reason } => format!("{reason}: {address}"),
            Self::WalletNotConnected => "Wallet not connected".to_string(),
            Self::AccountNotFound { address } => format!("Account not found: {address}"),
            Self::SubmissionRejected { reason } => reason.clone(),
        }
    }

    /// Classify an RPC failure hit by the pipeline.
    ///
    /// A JSON-RPC error from `simulateTransaction` or `sendTransaction` is the
    /// node refusing the transaction, not the network being down.
    pub fn from_rpc(err: RpcError) -> Self {
        match err {
            RpcError::AccountNotFound { address } => Self::AccountNotFound { address },
            RpcError::Rejected { method, message, .. } if method == "simulateTransaction" => {
                Self::SimulationFailed { message }
            }
            RpcError::Rejected { method, message, .. } if method == "sendTransaction" => {
                Self::SubmissionRejected { reason: message }
            }
            other => Self::NetworkUnavailable {
                message: other.to_string(),
            },
        }
    }
}

impl From<WalletError> for TxError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotConnected => Self::WalletNotConnected,
            other => Self::SigningDeclined {
                message: other.to_string(),
            },
        }
    }
}
