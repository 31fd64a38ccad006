use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;

use auth::IdentityProvider;
use rpc::{dispatcher::Dispatcher, registry::MethodRegistry};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Freezes `registry`; no methods can be added once serving starts.
    pub fn new(registry: MethodRegistry, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(registry)),
            identity,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let rpc = Router::new()
        .route(http::handlers::RPC_ENDPOINT, post(http::handlers::rpc_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_caller_roles,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/jsonrpc", get(http::handlers::discovery))
        .merge(rpc)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::auth::TokenRoles;
    use crate::domain::methods::{register_default_methods, register_method_listing};

    use super::*;

    fn app() -> Router {
        let mut registry = MethodRegistry::new();
        register_default_methods(&mut registry).expect("default methods");
        register_method_listing(&mut registry).expect("method listing");
        let identity = TokenRoles::new(HashMap::from([
            (
                "admin-token".to_string(),
                HashSet::from(["admin".to_string()]),
            ),
            (
                "reader-token".to_string(),
                HashSet::from(["reader".to_string()]),
            ),
        ]));
        build_app(AppState::new(registry, Arc::new(identity)))
    }

    fn rpc_request(body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/jsonrpc")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request build")
    }

    async fn send(request: Request<Body>) -> (StatusCode, String) {
        let response = app().oneshot(request).await.expect("request execution");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (
            status,
            String::from_utf8(body.to_vec()).expect("utf8 response body"),
        )
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send(
            Request::builder()
                .uri("/health")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"status\":\"ok\"}");
    }

    #[tokio::test]
    async fn discovery_lists_registered_methods() {
        let (status, body) = send(
            Request::builder()
                .uri("/.well-known/jsonrpc")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body_json: serde_json::Value =
            serde_json::from_str(&body).expect("valid json response");
        assert_eq!(body_json["rpc_endpoint"], "/jsonrpc");
        assert_eq!(body_json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(
            body_json["methods"],
            serde_json::json!(["add", "echo", "server.methods", "server.time"])
        );
    }

    #[tokio::test]
    async fn anonymous_echo_succeeds() {
        let (status, body) = send(rpc_request(
            r#"{"id":1,"jsonrpc":"2.0","method":"echo","params":["hi"]}"#,
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"result":"hi","jsonrpc":"2.0","id":1}"#);
    }

    #[tokio::test]
    async fn add_returns_sum() {
        let (status, body) = send(rpc_request(
            r#"{"id":5,"jsonrpc":"2.0","method":"add","params":[2,40]}"#,
            Some("reader-token"),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"result":42,"jsonrpc":"2.0","id":5}"#);
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let (status, body) = send(rpc_request(
            r#"{"id":1,"jsonrpc":"2.0","method":"missing","params":[]}"#,
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body,
            r#"{"error":{"message":"method missing is missing","code":-32601}}"#
        );
    }

    #[tokio::test]
    async fn malformed_body_returns_parse_error() {
        let (status, body) = send(rpc_request("{\"id\":", None)).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body,
            r#"{"error":{"message":"unable to parse json","code":-32700}}"#
        );
    }

    #[tokio::test]
    async fn handler_failure_returns_internal_error() {
        let (status, body) = send(rpc_request(
            r#"{"id":3,"jsonrpc":"2.0","method":"add","params":["a",1]}"#,
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body, r#"{"error":{"message":"error :(","code":-32603}}"#);
    }

    #[tokio::test]
    async fn restricted_method_denies_anonymous_caller() {
        let (status, body) = send(rpc_request(
            r#"{"id":1,"jsonrpc":"2.0","method":"server.time","params":[]}"#,
            None,
        ))
        .await;

        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body, r#"{"error":"not authorized"}"#);
    }

    #[tokio::test]
    async fn restricted_method_denies_caller_without_role() {
        let (status, body) = send(rpc_request(
            r#"{"id":1,"jsonrpc":"2.0","method":"server.time","params":[]}"#,
            Some("reader-token"),
        ))
        .await;

        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body, r#"{"error":"not authorized"}"#);
    }

    #[tokio::test]
    async fn restricted_method_allows_whitelisted_role() {
        let (status, body) = send(rpc_request(
            r#"{"id":8,"jsonrpc":"2.0","method":"server.time","params":[]}"#,
            Some("admin-token"),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        let body_json: serde_json::Value =
            serde_json::from_str(&body).expect("valid json response");
        assert_eq!(body_json["id"], 8);
        assert!(body_json["result"].is_string());
    }

    #[tokio::test]
    async fn unknown_token_is_unauthorized() {
        let (status, body) = send(rpc_request(
            r#"{"id":1,"jsonrpc":"2.0","method":"echo","params":["hi"]}"#,
            Some("stolen"),
        ))
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body_json: serde_json::Value =
            serde_json::from_str(&body).expect("valid json response");
        assert_eq!(body_json["code"], "invalid_token");
    }

    #[tokio::test]
    async fn get_on_rpc_endpoint_is_not_allowed() {
        let (status, _) = send(
            Request::builder()
                .uri("/jsonrpc")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
