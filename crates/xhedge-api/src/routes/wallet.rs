//! Wallet session endpoints
//!
//! Connecting and signing happen on relay pages; `/wallet/pending` lists the
//! page URLs the dashboard should open while a request waits.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use wallet_relay::PendingSummary;
use xhedge_core::WalletSession;

use crate::AppState;

/// Create wallet routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/refresh", post(refresh))
        .route("/pending", get(pending))
}

/// GET /wallet/status - Current session
pub async fn get_status(State(state): State<AppState>) -> Json<WalletSession> {
    Json(state.wallet().await)
}

/// POST /wallet/connect - Request access; returns once the user answers
pub async fn connect(State(state): State<AppState>) -> Json<WalletSession> {
    Json(state.connect_wallet().await)
}

/// POST /wallet/disconnect - Forget the connection locally
pub async fn disconnect(State(state): State<AppState>) -> Json<WalletSession> {
    Json(state.disconnect_wallet().await)
}

/// POST /wallet/refresh - Re-run the wallet probe
pub async fn refresh(State(state): State<AppState>) -> Json<WalletSession> {
    Json(state.probe_wallet().await)
}

/// GET /wallet/pending - Open relay requests
pub async fn pending(State(state): State<AppState>) -> Json<Vec<PendingSummary>> {
    Json(state.signer().relay().pending().await)
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::routes::test_util::*;
    use crate::state::tests::{authorize, test_state, KEY};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;
    use wallet_relay::WalletCallback;

    #[tokio::test]
    async fn test_status_starts_unknown() {
        let app = create_router(test_state("wallet-status").await);
        let response = app.oneshot(get("/wallet/status")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["loading"], true);
        assert_eq!(body["connected"], false);
        assert_eq!(body["publicKey"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_refresh_then_disconnect() {
        let state = test_state("wallet-refresh").await;
        authorize(&state).await;
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(post_json("/wallet/refresh", json!({})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["connected"], true);
        assert_eq!(body["publicKey"], KEY);

        let response = app
            .oneshot(post_json("/wallet/disconnect", json!({})))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["connected"], false);
        assert_eq!(body["installed"], true);
    }

    #[tokio::test]
    async fn test_connect_waits_for_relay_page() {
        let state = test_state("wallet-connect").await;
        let app = create_router(state.clone());

        let connecting = tokio::spawn({
            let app = app.clone();
            async move { app.oneshot(post_json("/wallet/connect", json!({}))).await }
        });

        // The open request shows up in the pending list
        let id = loop {
            let response = app.clone().oneshot(get("/wallet/pending")).await.unwrap();
            let body = body_json(response).await;
            if let Some(first) = body.as_array().and_then(|a| a.first()) {
                assert_eq!(first["kind"], "connect");
                break first["id"].as_str().unwrap().to_string();
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        };

        // Answer it the way the connect page would
        let relay_state = state.signer().relay().state().clone();
        {
            let mut requests = relay_state.pending_requests.write().await;
            let request = requests.get_mut(&id).unwrap();
            request.status = request
                .resolve(&WalletCallback {
                    public_key: Some(KEY.into()),
                    ..Default::default()
                })
                .unwrap();
        }

        let response = connecting.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["connected"], true);
        assert_eq!(body["publicKey"], KEY);
        assert_eq!(body["loading"], false);
    }
}
