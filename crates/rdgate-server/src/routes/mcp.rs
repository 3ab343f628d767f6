//! MCP JSON-RPC endpoint.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::mcp::{self, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::state::AppState;

/// POST /mcp - one JSON-RPC 2.0 message per request.
///
/// Unparseable bodies answer `-32700`, JSON that is not a request object
/// answers `-32600`. Notifications are acknowledged with 202 and no body.
pub async fn mcp_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return rpc_error(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e));
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return rpc_error(
                JsonRpcError::INVALID_REQUEST,
                format!("Invalid request: {}", e),
            );
        }
    };

    match mcp::handle(&state, request).await {
        Some(response) => {
            if response.is_error() {
                tracing::debug!(id = %response.id, "MCP request answered with error");
            }
            Json(response).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

fn rpc_error(code: i64, message: String) -> Response {
    Json(JsonRpcResponse::failure(
        Value::Null,
        JsonRpcError::new(code, message),
    ))
    .into_response()
}
