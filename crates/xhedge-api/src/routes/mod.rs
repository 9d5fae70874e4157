//! API route handlers

pub mod health;
pub mod network;
pub mod vault;
pub mod wallet;

use axum::{
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::dto::ApiError;
use crate::AppState;

/// Handler result: JSON body or a status with an error body
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Map a domain status code onto an HTTP status
pub(crate) fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/network", get(network::get_network).post(network::set_network))
        .route("/rpc/status", get(network::rpc_status))
        .nest("/wallet", wallet::router())
        .nest("/vault", vault::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_util {
    use axum::body::Body;
    use axum::http::Request;

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
