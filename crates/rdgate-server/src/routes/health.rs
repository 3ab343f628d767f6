//! Service descriptor and health check endpoints.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TOOLS;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Current time (RFC 3339, UTC).
    pub timestamp: String,
    /// Sessions held in memory by this process.
    pub active_sessions: usize,
}

/// GET / - Server information.
pub async fn root_handler() -> Json<Value> {
    let tools: Vec<Value> = TOOLS
        .iter()
        .map(|(name, description)| serde_json::json!({ "name": name, "description": description }))
        .collect();

    Json(serde_json::json!({
        "name": "Real-Debrid Gateway (OAuth)",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "transport": "HTTP/JSON, MCP JSON-RPC 2.0",
        "authentication": "OAuth Device Code Flow",
        "endpoints": {
            "root": "/",
            "health": "/health",
            "tools": "/tools/{name} (POST, JSON arguments)",
            "mcp": "/mcp (POST, JSON-RPC 2.0)",
        },
        "usage": "Use oauth_start tool to begin authentication",
        "tools": tools.len(),
        "tool_list": tools,
    }))
}

/// GET /health - Liveness plus active session count.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "rdgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        active_sessions: state.active_sessions(),
    })
}
