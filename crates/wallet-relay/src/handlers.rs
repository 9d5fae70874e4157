//! HTTP request handlers for the wallet relay

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Html,
    Json,
};

use crate::freighter_page::{generate_connect_page, generate_signing_page};
use crate::server::ServerState;
use crate::types::{PendingRequest, RequestKind, RequestPayload, RequestStatus, WalletCallback};

/// Header carrying the request secret from the page
pub const TOKEN_HEADER: &str = "x-relay-token";

/// Only the relay's own pages may read or answer a request: a foreign
/// `Origin` is refused, and the page's secret must be echoed back.
fn authorize(
    state: &ServerState,
    headers: &HeaderMap,
    request: &PendingRequest,
) -> Result<(), StatusCode> {
    if let Some(origin) = headers.get(header::ORIGIN) {
        if origin.as_bytes() != state.base_url().as_bytes() {
            tracing::warn!(?origin, "Refusing cross-origin relay call for {}", request.id);
            return Err(StatusCode::FORBIDDEN);
        }
    }
    let token = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if !request.accepts_token(token) {
        tracing::warn!("Relay call for {} without a valid token", request.id);
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

/// Serve the Freighter connect page
/// GET /freighter/connect/{id}
pub async fn handle_connect_page(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let requests = state.pending_requests.read().await;
    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;

    if request.is_expired() {
        return Err(StatusCode::GONE);
    }
    if !matches!(request.kind, RequestKind::Connect) {
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(Html(generate_connect_page(
        &request_id,
        &request.secret,
        &state.base_url(),
    )))
}

/// Serve the Freighter signing page
/// GET /freighter/sign/{id}
pub async fn handle_sign_page(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let requests = state.pending_requests.read().await;
    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;

    if request.is_expired() {
        return Err(StatusCode::GONE);
    }
    let message = match &request.kind {
        RequestKind::Sign { message, .. } => message.clone(),
        RequestKind::Connect => return Err(StatusCode::BAD_REQUEST),
    };

    Ok(Html(generate_signing_page(
        &request_id,
        &request.secret,
        &message,
        &state.base_url(),
    )))
}

/// Request details for the page
/// GET /request/{id}
pub async fn handle_request(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RequestPayload>, StatusCode> {
    let requests = state.pending_requests.read().await;
    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;
    authorize(&state, &headers, request)?;

    if request.is_expired() {
        return Err(StatusCode::GONE);
    }
    if !request.is_pending() {
        return Err(StatusCode::CONFLICT);
    }

    Ok(Json(RequestPayload::from(request)))
}

/// Page result
/// POST /callback/{id}
pub async fn handle_callback(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<WalletCallback>,
) -> Result<StatusCode, StatusCode> {
    let mut requests = state.pending_requests.write().await;
    let request = requests.get_mut(&request_id).ok_or(StatusCode::NOT_FOUND)?;
    authorize(&state, &headers, request)?;

    if request.is_expired() {
        request.status = RequestStatus::Expired;
        return Err(StatusCode::GONE);
    }
    if !request.is_pending() {
        return Err(StatusCode::CONFLICT);
    }

    let status = request.resolve(&payload).ok_or(StatusCode::BAD_REQUEST)?;

    {
        let mut wallet = state.wallet.write().await;
        if let Some(present) = payload.extension_present {
            wallet.extension_present = present;
        }
        match &status {
            RequestStatus::Connected(key) => {
                wallet.extension_present = true;
                wallet.authorized_key = Some(key.clone());
            }
            RequestStatus::ExtensionMissing => {
                wallet.authorized_key = None;
            }
            _ => {}
        }
        if payload.allowed == Some(false) {
            wallet.authorized_key = None;
        }
    }

    match &status {
        RequestStatus::Connected(key) => {
            tracing::info!("Wallet connected: {} for request {}", key, request_id)
        }
        RequestStatus::Signed(_) => tracing::info!("Transaction signed for request {}", request_id),
        other => tracing::info!(?other, "Wallet request {} ended", request_id),
    }

    request.status = status;
    Ok(StatusCode::OK)
}
