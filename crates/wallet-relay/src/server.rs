//! Axum HTTP server for the wallet relay

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, Method};
use axum::{routing::get, routing::post, Router};
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};
use xhedge_core::TxBlob;

use crate::handlers::{
    handle_callback, handle_connect_page, handle_request, handle_sign_page, TOKEN_HEADER,
};
use crate::types::{PendingRequest, PendingSummary, RequestStatus, WalletInfo, REQUEST_TTL};

/// How often expired requests are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state
pub struct ServerState {
    /// Port the server is running on
    pub port: u16,
    /// Host used in page URLs
    pub host: String,
    /// Lifetime of new requests
    pub ttl: Duration,
    /// Pending requests by ID
    pub pending_requests: RwLock<HashMap<String, PendingRequest>>,
    /// Last extension state reported by a page
    pub wallet: RwLock<WalletInfo>,
}

impl ServerState {
    pub fn new(host: impl Into<String>, port: u16, ttl: Duration) -> Self {
        Self {
            port,
            host: host.into(),
            ttl,
            pending_requests: RwLock::new(HashMap::new()),
            wallet: RwLock::new(WalletInfo::default()),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Page URL the user opens to answer a request
    pub fn page_url(&self, request: &PendingRequest) -> String {
        format!(
            "{}/freighter/{}/{}",
            self.base_url(),
            request.kind.as_str(),
            request.id
        )
    }

    async fn insert(&self, request: PendingRequest) -> (String, String) {
        let id = request.id.clone();
        let url = self.page_url(&request);
        self.pending_requests.write().await.insert(id.clone(), request);
        (id, url)
    }

    /// Drop expired requests
    pub async fn sweep_expired(&self) {
        let mut requests = self.pending_requests.write().await;
        requests.retain(|id, req| {
            let expired = req.is_expired();
            if expired {
                tracing::debug!("Cleaning up expired request: {}", id);
            }
            !expired
        });
    }
}

/// Build the relay router over `state`.
///
/// Cross-origin access is limited to the relay's own origin, so only its
/// pages can read request details or post callbacks.
pub fn router(state: Arc<ServerState>) -> Router {
    let own_origin = state.base_url();
    Router::new()
        .route("/freighter/connect/:id", get(handle_connect_page))
        .route("/freighter/sign/:id", get(handle_sign_page))
        .route("/request/:id", get(handle_request))
        .route("/callback/:id", post(handle_callback))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    origin.as_bytes() == own_origin.as_bytes()
                }))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)]),
        )
        .with_state(state)
}

/// Local relay between the Freighter extension and the backend
pub struct WalletRelay {
    state: Arc<ServerState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl WalletRelay {
    /// Start on an available port
    pub async fn start() -> Result<Self, std::io::Error> {
        Self::start_on_port(0, REQUEST_TTL).await
    }

    /// Start on a specific loopback port (0 for auto-assign)
    pub async fn start_on_port(port: u16, ttl: Duration) -> Result<Self, std::io::Error> {
        // Loopback only: the pages run in the user's own browser
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        let state = Arc::new(ServerState::new("127.0.0.1", actual_port, ttl));
        let app = router(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            tracing::info!("Wallet relay starting on port {}", actual_port);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Wallet relay shutting down");
                })
                .await
                .ok();
        });

        let cleanup_state = Arc::downgrade(&state);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                match cleanup_state.upgrade() {
                    Some(state) => state.sweep_expired().await,
                    None => break,
                }
            }
        });

        Ok(Self {
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Relay over existing state without binding a socket
    pub fn detached(state: Arc<ServerState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
        }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.state.port
    }

    pub fn base_url(&self) -> String {
        self.state.base_url()
    }

    /// Create a connect request; returns (id, page URL)
    pub async fn create_connect_request(&self) -> (String, String) {
        let request = PendingRequest::new_connect(generate_request_id(), self.state.ttl);
        self.state.insert(request).await
    }

    /// Create a signing request; returns (id, page URL)
    pub async fn create_sign_request(
        &self,
        unsigned: TxBlob,
        passphrase: &str,
        message: String,
    ) -> (String, String) {
        let request = PendingRequest::new_sign(
            generate_request_id(),
            self.state.ttl,
            unsigned,
            passphrase.to_string(),
            message,
        );
        self.state.insert(request).await
    }

    /// Current status; expired requests report `Expired`
    pub async fn request_status(&self, request_id: &str) -> Option<RequestStatus> {
        let requests = self.state.pending_requests.read().await;
        requests.get(request_id).map(|r| {
            if r.is_pending() && r.is_expired() {
                RequestStatus::Expired
            } else {
                r.status.clone()
            }
        })
    }

    pub async fn cancel_request(&self, request_id: &str) {
        let mut requests = self.state.pending_requests.write().await;
        requests.remove(request_id);
    }

    pub async fn pending(&self) -> Vec<PendingSummary> {
        pending_summaries(&self.state).await
    }

    pub async fn wallet_info(&self) -> WalletInfo {
        self.state.wallet.read().await.clone()
    }
}

impl Drop for WalletRelay {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn pending_summaries(state: &ServerState) -> Vec<PendingSummary> {
    let requests = state.pending_requests.read().await;
    let mut open: Vec<PendingSummary> = requests
        .values()
        .filter(|r| r.is_pending() && !r.is_expired())
        .map(|r| PendingSummary {
            id: r.id.clone(),
            kind: r.kind.as_str(),
            url: state.page_url(r),
            age_secs: r.created_at.elapsed().as_secs(),
        })
        .collect();
    open.sort_by(|a, b| b.age_secs.cmp(&a.age_secs));
    open
}

/// Random request ID: timestamp + random suffix
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let random: u32 = rand::random();
    format!("{:x}{:08x}", timestamp, random)
}
