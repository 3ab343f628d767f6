//! MCP (Model Context Protocol) server surface.
//!
//! Exposes the same six tools as `/tools/{name}` through JSON-RPC 2.0:
//! `initialize`, `ping`, `tools/list` and `tools/call`. Tool failures
//! (unknown session, Real-Debrid errors, bad arguments) come back as
//! `isError` tool results carrying the error text. Only malformed protocol
//! messages become JSON-RPC errors.

pub mod protocol;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::error::ServerError;
use crate::routes::{TOOLS, auth, tools};
use crate::state::AppState;

pub use protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolContent, ToolInfo,
    ToolsCapability,
};

const INSTRUCTIONS: &str = "Call oauth_start, have the user enter the code at the verification URL, \
then poll oauth_check with the device_code until it returns a session_id. Pass that session_id \
to every other tool.";

/// Handle one JSON-RPC message. Notifications yield no response.
pub async fn handle(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.is_notification() {
        tracing::debug!(method = %request.method, "MCP notification");
        return None;
    }
    let id = request.id.unwrap_or(Value::Null);

    if request.jsonrpc != protocol::JSONRPC_VERSION {
        return Some(JsonRpcResponse::failure(
            id,
            JsonRpcError::new(JsonRpcError::INVALID_REQUEST, "jsonrpc must be \"2.0\""),
        ));
    }

    let result = match request.method.as_str() {
        "initialize" => initialize(request.params.as_ref()),
        "ping" => Ok(json!({})),
        "tools/list" => rpc_value(ListToolsResult {
            tools: tool_definitions(),
        }),
        "tools/call" => match call_params(request.params) {
            Ok(params) => rpc_value(call_tool(state, params).await),
            Err(e) => Err(e),
        },
        other => Err(JsonRpcError::new(
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Method not found: {}", other),
        )),
    };

    Some(match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(error) => JsonRpcResponse::failure(id, error),
    })
}

fn initialize(params: Option<&Value>) -> Result<Value, JsonRpcError> {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);
    let protocol_version = match requested {
        Some(version) if protocol::SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => version,
        _ => protocol::MCP_PROTOCOL_VERSION,
    };
    tracing::info!(protocol_version, "MCP client initialized");

    rpc_value(InitializeResult {
        protocol_version: protocol_version.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        },
        server_info: ServerInfo::default(),
        instructions: Some(INSTRUCTIONS.to_string()),
    })
}

fn call_params(params: Option<Value>) -> Result<CallToolParams, JsonRpcError> {
    let params = params.ok_or_else(|| {
        JsonRpcError::new(JsonRpcError::INVALID_PARAMS, "tools/call requires params")
    })?;
    let params: CallToolParams = serde_json::from_value(params).map_err(|e| {
        JsonRpcError::new(
            JsonRpcError::INVALID_PARAMS,
            format!("Invalid tools/call params: {}", e),
        )
    })?;

    if !TOOLS.iter().any(|(name, _)| *name == params.name) {
        return Err(JsonRpcError::new(
            JsonRpcError::INVALID_PARAMS,
            format!("Unknown tool: {}", params.name),
        ));
    }
    Ok(params)
}

/// Run a tool and wrap the outcome as an MCP tool result.
pub async fn call_tool(state: &AppState, params: CallToolParams) -> CallToolResult {
    let arguments = params
        .arguments
        .filter(|a| !a.is_null())
        .unwrap_or_else(|| json!({}));

    let outcome = dispatch(state, &params.name, arguments).await.and_then(|value| {
        serde_json::to_string_pretty(&value).map_err(|e| ServerError::Internal(e.to_string()))
    });

    let result = match outcome {
        Ok(text) => CallToolResult::text(text),
        Err(e) => {
            tracing::warn!(tool = %params.name, error = %e, "MCP tool call failed");
            CallToolResult::error(e.to_string())
        }
    };
    tracing::debug!(tool = %params.name, is_error = result.is_error(), "MCP tool call");
    result
}

async fn dispatch(state: &AppState, name: &str, arguments: Value) -> Result<Value, ServerError> {
    match name {
        "oauth_start" => to_value(auth::oauth_start(state).await?),
        "oauth_check" => to_value(auth::oauth_check(state, parse_args(name, arguments)?).await?),
        "get_user_info" => tools::get_user_info(state, parse_args(name, arguments)?).await,
        "unrestrict_link" => tools::unrestrict_link(state, parse_args(name, arguments)?).await,
        "list_torrents" => tools::list_torrents(state, parse_args(name, arguments)?).await,
        "add_magnet" => tools::add_magnet(state, parse_args(name, arguments)?).await,
        other => Err(ServerError::BadRequest(format!("Unknown tool: {}", other))),
    }
}

/// Advertised tools with their input schemas.
pub fn tool_definitions() -> Vec<ToolInfo> {
    TOOLS
        .iter()
        .map(|(name, description)| ToolInfo {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema: input_schema(name),
        })
        .collect()
}

fn input_schema(tool: &str) -> Value {
    let session_id = json!({ "type": "string", "description": "Session ID from oauth_check" });
    match tool {
        "oauth_check" => json!({
            "type": "object",
            "properties": {
                "device_code": { "type": "string", "description": "Device code from oauth_start" }
            },
            "required": ["device_code"]
        }),
        "get_user_info" => json!({
            "type": "object",
            "properties": { "session_id": session_id },
            "required": ["session_id"]
        }),
        "unrestrict_link" => json!({
            "type": "object",
            "properties": {
                "session_id": session_id,
                "link": { "type": "string", "description": "The hoster link to unrestrict" },
                "password": { "type": "string", "description": "Optional password for protected files" }
            },
            "required": ["session_id", "link"]
        }),
        "list_torrents" => json!({
            "type": "object",
            "properties": {
                "session_id": session_id,
                "filter": { "type": "string", "description": "'active' for active torrents only" }
            },
            "required": ["session_id"]
        }),
        "add_magnet" => json!({
            "type": "object",
            "properties": {
                "session_id": session_id,
                "magnet": { "type": "string", "description": "The magnet link" }
            },
            "required": ["session_id", "magnet"]
        }),
        _ => json!({ "type": "object", "properties": {} }),
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ServerError> {
    serde_json::from_value(arguments)
        .map_err(|e| ServerError::BadRequest(format!("Invalid arguments for {}: {}", tool, e)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ServerError> {
    serde_json::to_value(value).map_err(|e| ServerError::Internal(e.to_string()))
}

fn rpc_value<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string()))
}
