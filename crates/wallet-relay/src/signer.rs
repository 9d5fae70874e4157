//! Wallet capability backed by the relay
//!
//! Each call that needs the user opens a request, logs the page URL and
//! polls until a page answers or the request expires.

use std::sync::Arc;
use std::time::Duration;

use xhedge_core::{Address, TxBlob, WalletError, WalletProbe, WalletSigner};

use crate::server::WalletRelay;
use crate::types::RequestStatus;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct RelaySigner {
    relay: Arc<WalletRelay>,
    poll_interval: Duration,
}

impl RelaySigner {
    pub fn new(relay: Arc<WalletRelay>) -> Self {
        Self {
            relay,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn relay(&self) -> &Arc<WalletRelay> {
        &self.relay
    }

    /// Wait for a terminal status, then forget the request
    async fn wait_for(&self, request_id: &str) -> Result<RequestStatus, WalletError> {
        loop {
            match self.relay.request_status(request_id).await {
                Some(RequestStatus::Pending) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Some(RequestStatus::Expired) | None => {
                    self.relay.cancel_request(request_id).await;
                    return Err(WalletError::Expired);
                }
                Some(status) => {
                    self.relay.cancel_request(request_id).await;
                    return Ok(status);
                }
            }
        }
    }
}

fn status_error(status: RequestStatus) -> WalletError {
    match status {
        RequestStatus::Declined(reason) => WalletError::Declined { reason },
        RequestStatus::ExtensionMissing => WalletError::ExtensionMissing,
        RequestStatus::Expired => WalletError::Expired,
        RequestStatus::Failed(message) => WalletError::Relay { message },
        other => WalletError::Relay {
            message: format!("Unexpected wallet response: {:?}", other),
        },
    }
}

impl WalletSigner for RelaySigner {
    async fn probe(&self) -> Result<WalletProbe, WalletError> {
        let info = self.relay.wallet_info().await;
        Ok(WalletProbe {
            extension_present: info.extension_present,
            previously_authorized: info.authorized_key.is_some(),
        })
    }

    async fn request_access(&self) -> Result<Address, WalletError> {
        let (id, url) = self.relay.create_connect_request().await;
        tracing::info!(request_id = %id, "Open {} to connect Freighter", url);

        match self.wait_for(&id).await? {
            RequestStatus::Connected(key) => Ok(key),
            other => Err(status_error(other)),
        }
    }

    async fn public_key(&self) -> Result<Address, WalletError> {
        self.relay
            .wallet_info()
            .await
            .authorized_key
            .ok_or(WalletError::NotConnected)
    }

    async fn sign(&self, unsigned: &TxBlob, passphrase: &str) -> Result<TxBlob, WalletError> {
        let (id, url) = self
            .relay
            .create_sign_request(
                unsigned.clone(),
                passphrase,
                "Approve this vault transaction in Freighter".to_string(),
            )
            .await;
        tracing::info!(request_id = %id, "Open {} to sign the transaction", url);

        match self.wait_for(&id).await? {
            RequestStatus::Signed(blob) => Ok(blob),
            other => Err(status_error(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerState;
    use crate::types::{WalletCallback, REQUEST_TTL};

    const KEY: &str = "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX";

    fn signer(ttl: Duration) -> RelaySigner {
        let state = Arc::new(ServerState::new("127.0.0.1", 4000, ttl));
        RelaySigner::new(Arc::new(WalletRelay::detached(state)))
            .with_poll_interval(Duration::from_millis(5))
    }

    /// Answer the first open request the way a page would
    async fn answer(signer: &RelaySigner, callback: WalletCallback) {
        loop {
            let pending = signer.relay().pending().await;
            if let Some(first) = pending.first() {
                let state = signer.relay().state();
                let mut requests = state.pending_requests.write().await;
                let request = requests.get_mut(&first.id).unwrap();
                request.status = request.resolve(&callback).unwrap();
                if let RequestStatus::Connected(key) = &request.status {
                    state.wallet.write().await.authorized_key = Some(key.clone());
                }
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_request_access() {
        let signer = signer(REQUEST_TTL);
        let waiting = tokio::spawn({
            let signer = signer.clone();
            async move { signer.request_access().await }
        });

        answer(
            &signer,
            WalletCallback {
                public_key: Some(KEY.into()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(waiting.await.unwrap().unwrap(), Address::new(KEY));
        assert_eq!(signer.public_key().await.unwrap(), Address::new(KEY));
        assert!(signer.probe().await.unwrap().previously_authorized);
        assert!(signer.relay().pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_sign_declined() {
        let signer = signer(REQUEST_TTL);
        let waiting = tokio::spawn({
            let signer = signer.clone();
            async move {
                signer
                    .sign(&TxBlob::new("AAAA"), "Test SDF Network ; September 2015")
                    .await
            }
        });

        answer(
            &signer,
            WalletCallback {
                error: Some("User declined access".into()),
                declined: true,
                ..Default::default()
            },
        )
        .await;

        match waiting.await.unwrap() {
            Err(WalletError::Declined { reason }) => assert_eq!(reason, "User declined access"),
            other => panic!("expected decline, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_returns_signed_blob() {
        let signer = signer(REQUEST_TTL);
        let waiting = tokio::spawn({
            let signer = signer.clone();
            async move { signer.sign(&TxBlob::new("AAAA"), "passphrase").await }
        });

        answer(
            &signer,
            WalletCallback {
                signed_tx_xdr: Some("SIGNED".into()),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(waiting.await.unwrap().unwrap(), TxBlob::new("SIGNED"));
    }

    #[tokio::test]
    async fn test_unanswered_request_expires() {
        let signer = signer(Duration::from_millis(20));
        let err = signer.request_access().await.unwrap_err();
        assert!(matches!(err, WalletError::Expired));
    }

    #[tokio::test]
    async fn test_public_key_without_connection() {
        let signer = signer(REQUEST_TTL);
        assert!(matches!(
            signer.public_key().await,
            Err(WalletError::NotConnected)
        ));
        let probe = signer.probe().await.unwrap();
        assert!(!probe.extension_present);
        assert!(!probe.previously_authorized);
    }
}
