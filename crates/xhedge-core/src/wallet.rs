//! Wallet capability and session state
//!
//! The wallet extension owns the keys. This crate only ever sees public keys
//! and signed envelopes.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{Address, TxBlob, WalletError};

/// Result of probing for the wallet extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletProbe {
    pub extension_present: bool,
    /// Access was granted earlier; the extension keeps this flag, not us
    pub previously_authorized: bool,
}

/// Browser wallet capability
pub trait WalletSigner: Send + Sync {
    fn probe(&self) -> impl Future<Output = Result<WalletProbe, WalletError>> + Send;

    /// Prompt the user to grant access and return their public key
    fn request_access(&self) -> impl Future<Output = Result<Address, WalletError>> + Send;

    /// Public key of an already authorized wallet
    fn public_key(&self) -> impl Future<Output = Result<Address, WalletError>> + Send;

    /// Sign an assembled envelope for the network identified by `passphrase`
    fn sign(
        &self,
        unsigned: &TxBlob,
        passphrase: &str,
    ) -> impl Future<Output = Result<TxBlob, WalletError>> + Send;
}

/// Wallet connection state as seen by the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub installed: bool,
    pub connected: bool,
    pub public_key: Option<Address>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl Default for WalletSession {
    /// The "unknown" state, before the first probe resolves
    fn default() -> Self {
        Self {
            installed: false,
            connected: false,
            public_key: None,
            loading: true,
            last_error: None,
        }
    }
}

impl WalletSession {
    /// Mark an operation in flight, clearing the previous error
    pub fn begin(&mut self) {
        self.loading = true;
        self.last_error = None;
    }

    /// Extension missing: nothing to connect to
    pub fn not_installed(&mut self) {
        self.installed = false;
        self.connected = false;
        self.public_key = None;
        self.loading = false;
    }

    /// Extension present but not yet authorized for this app
    pub fn installed_idle(&mut self) {
        *self = Self {
            installed: true,
            loading: false,
            ..Self::default()
        };
    }

    pub fn connected(&mut self, public_key: Address) {
        *self = Self {
            installed: true,
            connected: true,
            public_key: Some(public_key),
            loading: false,
            last_error: None,
        };
    }

    /// Keep the current connection fields, record the error
    pub fn failed(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.last_error = Some(message.into());
    }

    /// Local disconnect; the extension has no revoke call
    pub fn disconnected(&mut self) {
        self.installed_idle();
    }

    pub fn address(&self) -> Option<&Address> {
        if self.connected {
            self.public_key.as_ref()
        } else {
            None
        }
    }
}
