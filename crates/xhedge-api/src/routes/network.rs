//! Network selection and RPC status endpoints

use axum::{extract::State, http::StatusCode, Json};
use soroban_rpc_client::{probe_rpc, RpcStatus};
use xhedge_core::Network;

use crate::dto::{ApiError, NetworkRequest, NetworkResponse};
use crate::routes::ApiResult;
use crate::AppState;

/// GET /network - Active network and its endpoints
pub async fn get_network(State(state): State<AppState>) -> Json<NetworkResponse> {
    Json(state.network().await.into())
}

/// POST /network - Switch network and remember the choice
pub async fn set_network(
    State(state): State<AppState>,
    Json(request): Json<NetworkRequest>,
) -> ApiResult<NetworkResponse> {
    let network: Network = request.network.parse().map_err(|e: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("invalid_network", e)),
        )
    })?;

    state.set_network(network).await.map_err(|e| {
        tracing::error!("Failed to persist network preference: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal(e.to_string())),
        )
    })?;

    Ok(Json(network.into()))
}

/// GET /rpc/status - Probe the active network's RPC endpoint
pub async fn rpc_status(State(state): State<AppState>) -> ApiResult<RpcStatus> {
    let client = state.rpc_client().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::unavailable(e.to_string())),
        )
    })?;

    Ok(Json(probe_rpc(&client).await))
}
