//! Vault endpoints
//!
//! - GET /vault/metrics - Cached snapshot, `?refresh=true` to re-read
//! - GET /vault/history - Connected user's recent deposits and withdrawals
//! - GET /vault/pipeline - State of the current or last transaction
//! - POST /vault/deposit, POST /vault/withdraw - Run the transaction pipeline

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use vault::{
    fetch_history, Pipeline, PipelineState, VaultAction, VaultError, VaultMetrics,
    VaultTransaction, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};

use crate::dto::{ApiError, HistoryQuery, MetricsQuery, VaultActionRequest, VaultActionResponse};
use crate::routes::{status, ApiResult};
use crate::state::StateError;
use crate::AppState;

/// Create vault routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/history", get(get_history))
        .route("/pipeline", get(get_pipeline))
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
}

fn vault_error(e: &VaultError) -> (StatusCode, Json<ApiError>) {
    match e {
        VaultError::Rpc(message) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::unavailable(message.clone())),
        ),
        VaultError::Transaction(tx) => (status(tx.status_code()), Json(ApiError::from(tx))),
        VaultError::Read(_) | VaultError::InvalidState(_) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiError::new("contract_read_failed", e.to_string())),
        ),
    }
}

fn state_error(e: StateError) -> (StatusCode, Json<ApiError>) {
    match &e {
        StateError::Vault(v) => vault_error(v),
        StateError::Rpc(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::unavailable(e.to_string())),
        ),
        StateError::Preferences(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::internal(e.to_string())),
        ),
        StateError::Superseded => (
            StatusCode::CONFLICT,
            Json(ApiError::new("metrics_superseded", e.to_string())),
        ),
    }
}

/// GET /vault/metrics
pub async fn get_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> ApiResult<VaultMetrics> {
    if !query.refresh {
        if let Some(metrics) = state.metrics().await {
            return Ok(Json(metrics));
        }
    }

    let metrics = state.refresh_metrics().await.map_err(|e| {
        tracing::warn!("Failed to read vault metrics: {}", e);
        state_error(e)
    })?;
    Ok(Json(metrics))
}

/// GET /vault/history?limit=N
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<VaultTransaction>> {
    let user = state.wallet().await.address().cloned().ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new("wallet_not_connected", "Wallet not connected")),
        )
    })?;

    let client = state
        .rpc_client()
        .await
        .map_err(|e| state_error(e.into()))?;
    let contract_id = state.config().await.contract_id;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let history = fetch_history(&client, &user, &contract_id, limit)
        .await
        .map_err(|e| vault_error(&e))?;
    Ok(Json(history))
}

/// GET /vault/pipeline
pub async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineState> {
    Json(state.pipeline_state())
}

/// POST /vault/deposit - Deposit `amount` USDC
pub async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<VaultActionRequest>,
) -> ApiResult<VaultActionResponse> {
    run_action(state, VaultAction::Deposit, request).await
}

/// POST /vault/withdraw - Redeem `amount` shares
pub async fn withdraw(
    State(state): State<AppState>,
    Json(request): Json<VaultActionRequest>,
) -> ApiResult<VaultActionResponse> {
    run_action(state, VaultAction::Withdraw, request).await
}

async fn run_action(
    state: AppState,
    action: VaultAction,
    request: VaultActionRequest,
) -> ApiResult<VaultActionResponse> {
    let _guard = state.try_begin_pipeline().ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            Json(ApiError::new(
                "pipeline_busy",
                "Another vault transaction is in progress",
            )),
        )
    })?;

    let client = state
        .rpc_client()
        .await
        .map_err(|e| state_error(e.into()))?;
    let user = state.wallet().await.address().cloned();
    let contract_id = state.config().await.contract_id;

    let observed = state.clone();
    let refreshed = state.clone();
    let pipeline = Pipeline::new(client.as_ref(), state.signer(), contract_id)
        .with_observer(move |s| observed.set_pipeline_state(s.clone()))
        .on_success(move |_| {
            // Reported success does not wait for the new snapshot
            let state = refreshed.clone();
            tokio::spawn(async move {
                if let Err(e) = state.refresh_metrics().await {
                    tracing::warn!("Metrics refresh after submission failed: {}", e);
                }
            });
        });

    match pipeline.run(user.as_ref(), action, &request.amount).await {
        Ok(success) => Ok(Json(VaultActionResponse::from(&success))),
        Err(failure) => Err((
            status(failure.error.status_code()),
            Json(ApiError::from(&failure)),
        )),
    }
}
