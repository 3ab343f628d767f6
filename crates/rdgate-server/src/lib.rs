//! HTTP tool server for Real-Debrid behind OAuth device-flow sessions.
//!
//! Exposes six JSON tools under `/tools/{name}`: `oauth_start` and
//! `oauth_check` drive the device authorization, the other four proxy the
//! Real-Debrid REST API for an authorized `session_id`. The same tools are
//! served to MCP clients as JSON-RPC 2.0 on `POST /mcp`. `/` describes the
//! service and `/health` reports the active session count.
//!
//! # Example
//!
//! ```ignore
//! use rdgate_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new().with_port(3000);
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod mcp;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use gateway::DebridApi;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// The rdgate HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server talking to the configured Real-Debrid endpoints.
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self {
            state: AppState::new(config)?,
        })
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(routes::root_handler))
            .route("/health", get(routes::health_handler))
            .route("/mcp", post(routes::mcp_handler))
            .nest("/tools", Self::tool_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        if self.state.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router
    }

    fn tool_routes() -> Router<AppState> {
        Router::new()
            .route("/oauth_start", post(routes::oauth_start_handler))
            .route("/oauth_check", post(routes::oauth_check_handler))
            .route("/get_user_info", post(routes::get_user_info_handler))
            .route("/unrestrict_link", post(routes::unrestrict_link_handler))
            .route("/list_torrents", post(routes::list_torrents_handler))
            .route("/add_magnet", post(routes::add_magnet_handler))
    }

    /// Run the server until the process exits.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!(addr = %local_addr, "Starting rdgate server");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Run in the background with graceful shutdown, returning the bound address.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<SocketAddr> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        info!(addr = %local_addr, "Starting rdgate server");

        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "Server stopped with error");
            }
        });
        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> Server {
        Server::new(ServerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_health_starts_at_zero_sessions() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: routes::HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.active_sessions, 0);
        assert!(health.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected_before_any_remote_call() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tools/get_user_info")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"session_id":"session_0_unknown"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "invalid_session");
    }

    #[tokio::test]
    async fn test_blank_device_code_is_bad_request() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/tools/oauth_check")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"device_code":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn post_json(
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, ErrorResponse) {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let response = server()
            .router()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_field_is_json_bad_request() {
        let (status, error) =
            post_json("/tools/get_user_info", Some("application/json"), "{}").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "bad_request");
        assert!(error.message.contains("session_id"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let (status, error) =
            post_json("/tools/oauth_check", Some("application/json"), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "bad_request");

        let (status, error) =
            post_json("/tools/add_magnet", None, r#"{"session_id":"s","magnet":"m"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, "bad_request");
    }

    #[tokio::test]
    async fn test_mcp_is_routed() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let rpc: mcp::JsonRpcResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(rpc.id, 1);
        assert_eq!(rpc.result.unwrap()["tools"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_tools_are_post_only() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/tools/oauth_start")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
