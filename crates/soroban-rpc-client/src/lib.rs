//! soroban-rpc-client: Soroban RPC and Horizon client with health probing
//!
//! This crate provides the chain capability used by the transaction pipeline:
//! account sequence lookups on Horizon, and `simulateTransaction` /
//! `sendTransaction` over Soroban JSON-RPC 2.0.

pub mod capabilities;
pub mod horizon;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use soroban_tx::SimulationResult;
use xhedge_core::{Address, Network, RpcConfig, RpcError, TxBlob, TxHash};

pub use capabilities::{probe_rpc, RpcStatus};
pub use horizon::{OperationRecord, OperationsPage};

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Source account state needed to build a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: Address,
    pub sequence: i64,
}

/// `sendTransaction` outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    /// `PENDING`, `DUPLICATE`, `TRY_AGAIN_LATER` or `ERROR`
    pub status: String,
    pub hash: TxHash,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
}

impl SubmitResult {
    /// Accepted for inclusion; nothing here says it was applied
    pub fn is_accepted(&self) -> bool {
        matches!(self.status.as_str(), "PENDING" | "SUCCESS")
    }

    /// Rejection reason: the status, plus the result XDR when present
    pub fn rejection_reason(&self) -> String {
        match &self.error_result_xdr {
            Some(xdr) => format!("{}: {}", self.status, xdr),
            None => self.status.clone(),
        }
    }
}

/// Chain capability consumed by the transaction pipeline
pub trait ChainRpc: Send + Sync {
    fn network(&self) -> Network;

    /// Read-only sequence lookup for the source account
    fn load_account(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<AccountState>> + Send;

    fn simulate(&self, unsigned: &TxBlob) -> impl Future<Output = Result<SimulationResult>> + Send;

    fn submit(&self, signed: &TxBlob) -> impl Future<Output = Result<SubmitResult>> + Send;
}

/// JSON-RPC 2.0 request envelope
#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response envelope
#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Soroban RPC + Horizon client bound to one network
pub struct RpcClient {
    http: reqwest::Client,
    network: Network,
    horizon_url: String,
    rpc_url: String,
    timeout: Duration,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Client for the network's public endpoints
    pub fn new(network: Network, config: &RpcConfig) -> Result<Self> {
        let endpoints = network.endpoints();
        Self::with_urls(network, endpoints.horizon_url, endpoints.rpc_url, config)
    }

    /// Client against explicit endpoints (local quickstart, tests)
    pub fn with_urls(
        network: Network,
        horizon_url: &str,
        rpc_url: &str,
        config: &RpcConfig,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: rpc_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            network,
            horizon_url: horizon_url.trim_end_matches('/').to_string(),
            rpc_url: rpc_url.trim_end_matches('/').to_string(),
            timeout,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn horizon_url(&self) -> &str {
        &self.horizon_url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC 2.0 method and return its `result`
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method,
            params,
        };

        tracing::debug!(method, url = %self.rpc_url, "JSON-RPC call");

        let (status, body) = self
            .fetch(self.http.post(&self.rpc_url).json(&request), &self.rpc_url)
            .await?;

        if !(200..300).contains(&status) {
            return Err(RpcError::ApiError {
                message: format!(
                    "{} returned HTTP {}: {}",
                    method,
                    status,
                    body.chars().take(500).collect::<String>()
                ),
            });
        }

        let envelope: JsonRpcResponse = serde_json::from_str(&body)
            .map_err(|e| RpcError::ParseError(format!("{}: {}", method, e)))?;

        unwrap_rpc_response(method, envelope)
    }

    /// Send a request and read the whole body within the per-call timeout
    async fn fetch(&self, request: reqwest::RequestBuilder, url: &str) -> Result<(u16, String)> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };
        timed_request(self.timeout, exchange)
            .await
            .map_err(|e| transport_error(e, url))
    }

    /// `GET` a Horizon path and return the parsed JSON body
    async fn horizon_get(&self, path: &str) -> Result<(u16, Value)> {
        let url = format!("{}{}", self.horizon_url, path);
        tracing::debug!(url = %url, "Horizon request");

        let (status, text) = self.fetch(self.http.get(&url), &url).await?;

        // Error bodies are problem+json, but a proxy may answer with anything
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) if status >= 400 => Value::Null,
            Err(e) => return Err(RpcError::ParseError(format!("{}: {}", path, e))),
        };
        Ok((status, body))
    }

    pub async fn get_account(&self, address: &Address) -> Result<AccountState> {
        let (status, body) = self
            .horizon_get(&format!("/accounts/{}", address))
            .await?;
        match status {
            404 => Err(RpcError::AccountNotFound {
                address: address.to_string(),
            }),
            s if s >= 400 => Err(RpcError::ApiError {
                message: horizon::problem_detail(&body, s),
            }),
            _ => horizon::parse_account(address, &body),
        }
    }

    /// Most recent operations on an account, newest first
    pub async fn account_operations(
        &self,
        address: &Address,
        limit: u32,
    ) -> Result<OperationsPage> {
        let path = format!(
            "/accounts/{}/operations?order=desc&limit={}&include_failed=true",
            address,
            limit.clamp(1, 200)
        );
        let (status, body) = self.horizon_get(&path).await?;
        match status {
            404 => Err(RpcError::AccountNotFound {
                address: address.to_string(),
            }),
            s if s >= 400 => Err(RpcError::ApiError {
                message: horizon::problem_detail(&body, s),
            }),
            _ => horizon::parse_operations(&body),
        }
    }

    pub async fn simulate_transaction(&self, unsigned: &TxBlob) -> Result<SimulationResult> {
        let result = self
            .call(
                "simulateTransaction",
                json!({ "transaction": unsigned.as_str() }),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::ParseError(format!("simulateTransaction: {}", e)))
    }

    pub async fn send_transaction(&self, signed: &TxBlob) -> Result<SubmitResult> {
        let result = self
            .call("sendTransaction", json!({ "transaction": signed.as_str() }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::ParseError(format!("sendTransaction: {}", e)))
    }

    /// `getHealth` status string (`healthy` when in sync)
    pub async fn get_health(&self) -> Result<String> {
        let result = self.call("getHealth", Value::Null).await?;
        Ok(result["status"].as_str().unwrap_or("unknown").to_string())
    }

    /// `getLatestLedger`: (sequence, protocol version)
    pub async fn get_latest_ledger(&self) -> Result<(u64, u64)> {
        let result = self.call("getLatestLedger", Value::Null).await?;
        let sequence = result["sequence"]
            .as_u64()
            .ok_or_else(|| RpcError::ParseError("getLatestLedger: missing sequence".into()))?;
        let protocol = result["protocolVersion"].as_u64().unwrap_or(0);
        Ok((sequence, protocol))
    }
}

impl ChainRpc for RpcClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn load_account(&self, address: &Address) -> Result<AccountState> {
        self.get_account(address).await
    }

    async fn simulate(&self, unsigned: &TxBlob) -> Result<SimulationResult> {
        self.simulate_transaction(unsigned).await
    }

    async fn submit(&self, signed: &TxBlob) -> Result<SubmitResult> {
        self.send_transaction(signed).await
    }
}

enum Transport {
    Timeout(Duration),
    Failed(reqwest::Error),
}

fn transport_error(err: Transport, url: &str) -> RpcError {
    match err {
        Transport::Timeout(limit) => RpcError::Timeout {
            secs: limit.as_secs(),
        },
        Transport::Failed(e) => RpcError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        },
    }
}

/// Wrap a request exchange with the per-call timeout. The client's own
/// timeout fires at the same limit and is reported the same way.
async fn timed_request<T>(
    limit: Duration,
    fut: impl Future<Output = std::result::Result<T, reqwest::Error>>,
) -> std::result::Result<T, Transport> {
    match tokio::time::timeout(limit, fut).await {
        Err(_) => Err(Transport::Timeout(limit)),
        Ok(Err(e)) if e.is_timeout() => Err(Transport::Timeout(limit)),
        Ok(Err(e)) => Err(Transport::Failed(e)),
        Ok(Ok(value)) => Ok(value),
    }
}

fn unwrap_rpc_response(method: &str, envelope: JsonRpcResponse) -> Result<Value> {
    if let Some(err) = envelope.error {
        return Err(RpcError::Rejected {
            method: method.to_string(),
            code: err.code,
            message: err.message,
        });
    }
    envelope.result.ok_or_else(|| RpcError::ParseError(format!("{}: empty result", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_network_endpoints() {
        let client = RpcClient::new(Network::Testnet, &RpcConfig::default()).unwrap();
        assert_eq!(client.rpc_url(), "https://rpc.testnet.stellar.org");
        assert_eq!(client.horizon_url(), "https://horizon-testnet.stellar.org");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_request_ids_increase() {
        let client = RpcClient::new(Network::Mainnet, &RpcConfig::default()).unwrap();
        let a = client.next_id();
        let b = client.next_id();
        assert!(b > a);
    }

    #[test]
    fn test_unwrap_rpc_response() {
        let ok: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": {"status": "healthy"}}))
                .unwrap();
        assert_eq!(
            unwrap_rpc_response("getHealth", ok).unwrap()["status"],
            "healthy"
        );

        let err: JsonRpcResponse = serde_json::from_value(
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "invalid params"}}),
        )
        .unwrap();
        match unwrap_rpc_response("sendTransaction", err).unwrap_err() {
            RpcError::Rejected {
                method,
                code,
                message,
            } => {
                assert_eq!(method, "sendTransaction");
                assert_eq!(code, -32602);
                assert_eq!(message, "invalid params");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_submit_result_status() {
        let pending: SubmitResult =
            serde_json::from_value(json!({"status": "PENDING", "hash": "abc123"})).unwrap();
        assert!(pending.is_accepted());
        assert_eq!(pending.hash.as_str(), "abc123");

        let rejected: SubmitResult = serde_json::from_value(
            json!({"status": "ERROR", "hash": "def", "errorResultXdr": "AAAA"}),
        )
        .unwrap();
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.rejection_reason(), "ERROR: AAAA");

        let later: SubmitResult =
            serde_json::from_value(json!({"status": "TRY_AGAIN_LATER", "hash": "x"})).unwrap();
        assert!(!later.is_accepted());
        assert_eq!(later.rejection_reason(), "TRY_AGAIN_LATER");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let config = RpcConfig { timeout_secs: 2 };
        let client =
            RpcClient::with_urls(Network::Testnet, "http://127.0.0.1:1", "http://127.0.0.1:1", &config)
                .unwrap();
        let err = client.get_health().await.unwrap_err();
        assert!(matches!(
            err,
            RpcError::Unreachable { .. } | RpcError::Timeout { .. }
        ));
    }

    /// One-connection HTTP server: captures the request head and answers
    /// with `response` verbatim.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (url, handle)
    }

    fn json_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            // headers promise more body than is ever sent
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n{")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = RpcConfig { timeout_secs: 1 };
        let client = RpcClient::with_urls(Network::Testnet, &url, &url, &config).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), client.get_health())
            .await
            .expect("call must honour the client timeout");
        assert!(matches!(result, Err(RpcError::Timeout { secs: 1 })));
    }

    #[tokio::test]
    async fn test_operations_include_failed() {
        let (url, request) =
            serve_once(json_response(r#"{"_embedded":{"records":[]}}"#)).await;
        let client =
            RpcClient::with_urls(Network::Testnet, &url, &url, &RpcConfig::default()).unwrap();

        let page = client
            .account_operations(&Address::new("GABC"), 20)
            .await
            .unwrap();
        assert!(page.records.is_empty());

        let head = request.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /accounts/GABC/operations?"));
        assert!(request_line.contains("order=desc"));
        assert!(request_line.contains("limit=20"));
        assert!(request_line.contains("include_failed=true"));
    }

    #[tokio::test]
    async fn test_simulate_rpc_error_is_rejection() {
        let (url, _request) = serve_once(json_response(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid transaction envelope"}}"#,
        ))
        .await;
        let client =
            RpcClient::with_urls(Network::Testnet, &url, &url, &RpcConfig::default()).unwrap();

        let err = client
            .simulate_transaction(&TxBlob::new("AAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Rejected { code: -32602, .. }));
        assert_eq!(
            xhedge_core::TxError::from_rpc(err),
            xhedge_core::TxError::SimulationFailed {
                message: "invalid transaction envelope".into()
            }
        );
    }

    #[tokio::test]
    async fn test_send_rpc_error_is_rejection() {
        let (url, _request) = serve_once(json_response(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32001,"message":"transaction malformed"}}"#,
        ))
        .await;
        let client =
            RpcClient::with_urls(Network::Testnet, &url, &url, &RpcConfig::default()).unwrap();

        let err = client.submit(&TxBlob::new("AAAA")).await.unwrap_err();
        assert_eq!(
            xhedge_core::TxError::from_rpc(err).error_code(),
            "submission_rejected"
        );
    }
}
