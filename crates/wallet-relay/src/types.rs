//! Relay request and callback types

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use xhedge_core::{Address, TxBlob};

/// Default lifetime of a pending request
pub const REQUEST_TTL: Duration = Duration::from_secs(300);

/// Callback payload posted by a Freighter page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCallback {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub signed_tx_xdr: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// The user refused the prompt (as opposed to an extension failure)
    #[serde(default)]
    pub declined: bool,
    /// Reported by every page once it has looked for the extension
    #[serde(default)]
    pub extension_present: Option<bool>,
    #[serde(default)]
    pub allowed: Option<bool>,
}

/// Type of pending request
#[derive(Debug, Clone)]
pub enum RequestKind {
    /// Grant access and report the public key
    Connect,
    /// Sign an assembled envelope
    Sign {
        unsigned: TxBlob,
        passphrase: String,
        message: String,
    },
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Sign { .. } => "sign",
        }
    }
}

/// Status of a pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    /// Waiting for the page to call back
    Pending,
    Connected(Address),
    Signed(TxBlob),
    /// User refused in the extension
    Declined(String),
    ExtensionMissing,
    Failed(String),
    Expired,
}

/// A pending wallet request
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: String,
    /// Only ever written into the page HTML; callbacks must echo it
    pub secret: String,
    pub kind: RequestKind,
    pub created_at: Instant,
    pub ttl: Duration,
    pub status: RequestStatus,
}

impl PendingRequest {
    pub fn new_connect(id: String, ttl: Duration) -> Self {
        Self {
            id,
            secret: generate_secret(),
            kind: RequestKind::Connect,
            created_at: Instant::now(),
            ttl,
            status: RequestStatus::Pending,
        }
    }

    pub fn new_sign(
        id: String,
        ttl: Duration,
        unsigned: TxBlob,
        passphrase: String,
        message: String,
    ) -> Self {
        Self {
            id,
            secret: generate_secret(),
            kind: RequestKind::Sign {
                unsigned,
                passphrase,
                message,
            },
            created_at: Instant::now(),
            ttl,
            status: RequestStatus::Pending,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// True when `token` is this request's secret
    pub fn accepts_token(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| t == self.secret)
    }

    /// Apply a page callback. Returns `None` when the payload does not fit
    /// the request kind.
    pub fn resolve(&self, callback: &WalletCallback) -> Option<RequestStatus> {
        if callback.extension_present == Some(false) {
            return Some(RequestStatus::ExtensionMissing);
        }
        if let Some(error) = &callback.error {
            return Some(if callback.declined {
                RequestStatus::Declined(error.clone())
            } else {
                RequestStatus::Failed(error.clone())
            });
        }

        match &self.kind {
            RequestKind::Connect => {
                let key = Address::new(callback.public_key.as_deref()?.trim());
                if key.looks_like_account() {
                    Some(RequestStatus::Connected(key))
                } else {
                    Some(RequestStatus::Failed(format!(
                        "Wallet returned an invalid public key: {}",
                        key
                    )))
                }
            }
            RequestKind::Sign { .. } => {
                let signed = callback.signed_tx_xdr.as_deref()?.trim();
                if signed.is_empty() {
                    return None;
                }
                Some(RequestStatus::Signed(TxBlob::new(signed)))
            }
        }
    }
}

/// 128 random bits, hex encoded
fn generate_secret() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `GET /request/:id` body, read by the pages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub id: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsigned_tx_xdr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_passphrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&PendingRequest> for RequestPayload {
    fn from(request: &PendingRequest) -> Self {
        let (unsigned_tx_xdr, network_passphrase, message) = match &request.kind {
            RequestKind::Connect => (None, None, None),
            RequestKind::Sign {
                unsigned,
                passphrase,
                message,
            } => (
                Some(unsigned.to_string()),
                Some(passphrase.clone()),
                Some(message.clone()),
            ),
        };
        Self {
            id: request.id.clone(),
            kind: request.kind.as_str(),
            unsigned_tx_xdr,
            network_passphrase,
            message,
        }
    }
}

/// Open request as listed to the backend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSummary {
    pub id: String,
    pub kind: &'static str,
    pub url: String,
    pub age_secs: u64,
}

/// What the pages have reported about the extension so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletInfo {
    pub extension_present: bool,
    pub authorized_key: Option<Address>,
}
