//! Axum HTTP handlers for the web server
//!
//! Provides the JSON-RPC endpoint and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use crate::auth::CallerRoles;
use crate::rpc::types::RpcResponse;
use crate::AppState;

pub const RPC_ENDPOINT: &str = "/jsonrpc";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub rpc_endpoint: &'static str,
    pub methods: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rpc_endpoint: RPC_ENDPOINT,
        methods: state.dispatcher.registry().method_names(),
    })
}

pub async fn rpc_endpoint(
    State(state): State<AppState>,
    Extension(CallerRoles(roles)): Extension<CallerRoles>,
    body: Bytes,
) -> Response {
    let response = state.dispatcher.handle_request(&body, &roles).await;
    (response_status(&response), Json(response)).into_response()
}

/// Error objects go out as 504 and authorization denials as 501, matching the
/// status codes existing clients of this endpoint expect.
pub fn response_status(response: &RpcResponse) -> StatusCode {
    match response {
        RpcResponse::Success { .. } => StatusCode::OK,
        RpcResponse::Error { .. } => StatusCode::GATEWAY_TIMEOUT,
        RpcResponse::Unauthorized { .. } => StatusCode::NOT_IMPLEMENTED,
    }
}
