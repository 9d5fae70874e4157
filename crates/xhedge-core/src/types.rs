//! Core type definitions for XHedge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stellar account address (G... strkey)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cheap shape check; checksum validation lives in `soroban_tx::address`
    pub fn looks_like_account(&self) -> bool {
        self.0.len() == 56 && self.0.starts_with('G')
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Soroban contract id (C... strkey)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, hex-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base64-encoded transaction envelope XDR, signed or unsigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxBlob(pub String);

impl TxBlob {
    pub fn new(xdr: impl Into<String>) -> Self {
        Self(xdr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TxBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Futurenet,
}

/// Endpoints and passphrase bound to a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEndpoints {
    /// Account/history REST endpoint
    pub horizon_url: &'static str,
    /// Soroban JSON-RPC endpoint
    pub rpc_url: &'static str,
    /// Network passphrase, hashed into every transaction signature payload
    pub passphrase: &'static str,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Futurenet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Futurenet => "futurenet",
        }
    }

    pub fn endpoints(&self) -> NetworkEndpoints {
        match self {
            Self::Mainnet => NetworkEndpoints {
                horizon_url: "https://horizon.stellar.org",
                rpc_url: "https://rpc.mainnet.stellar.org",
                passphrase: "Public Global Stellar Network ; September 2015",
            },
            Self::Testnet => NetworkEndpoints {
                horizon_url: "https://horizon-testnet.stellar.org",
                rpc_url: "https://rpc.testnet.stellar.org",
                passphrase: "Test SDF Network ; September 2015",
            },
            Self::Futurenet => NetworkEndpoints {
                horizon_url: "https://horizon-futurenet.stellar.org",
                rpc_url: "https://rpc-futurenet.stellar.org",
                passphrase: "Test SDF Future Network ; October 2022",
            },
        }
    }

    pub fn passphrase(&self) -> &'static str {
        self.endpoints().passphrase
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "public" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "futurenet" => Ok(Self::Futurenet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// Amount in stroops (1 unit = 10_000_000 stroops)
pub type Stroops = i128;

/// Constants
pub mod constants {
    use super::Stroops;

    /// Number of fractional digits in a display amount
    pub const DECIMALS: u32 = 7;

    /// 1 display unit in stroops
    pub const STROOPS_PER_UNIT: Stroops = 10_000_000;

    /// Fee ceiling per operation before resource fees are added
    pub const BASE_FEE: u32 = 100;

    /// Validity window applied to every built transaction (seconds)
    pub const TX_VALIDITY_SECS: u64 = 300;

    /// Vault underlying asset
    pub const ASSET_SYMBOL: &str = "USDC";

    /// Default deployed vault contract
    pub const DEFAULT_CONTRACT_ID: &str =
        "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";

    /// Storage key holding the last selected network
    pub const NETWORK_PREFERENCE_KEY: &str = "xhedge-network";
}
