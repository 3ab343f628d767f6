//! MCP JSON-RPC surface against a mock Real-Debrid.

mod common;

use anyhow::Result;
use common::{API_PREFIX, TestServer};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn rpc(server: &TestServer, body: Value) -> Result<(u16, Value)> {
    let response = server
        .client
        .post(server.url("/mcp"))
        .json(&body)
        .send()
        .await?;
    let status = response.status().as_u16();
    Ok((status, response.json().await?))
}

async fn call_tool(server: &TestServer, id: i64, name: &str, arguments: Value) -> Result<Value> {
    let (status, body) = rpc(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    )
    .await?;
    anyhow::ensure!(status == 200, "tools/call returned {status}: {body}");
    anyhow::ensure!(body["id"] == id, "id not echoed: {body}");
    Ok(body["result"].clone())
}

/// The pretty-printed JSON carried in a tool result's text content.
fn text_json(result: &Value) -> Result<Value> {
    let text = result["content"][0]["text"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("no text content: {result}"))?;
    Ok(serde_json::from_str(text)?)
}

#[tokio::test]
async fn test_initialize_and_list_tools() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.0.1" }
            }
        }),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "rdgate");

    let response = server
        .client
        .post(server.url("/mcp"))
        .json(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 202);

    let (status, body) = rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": "list-1", "method": "tools/list" }),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "list-1");
    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(
        names,
        [
            "oauth_start",
            "oauth_check",
            "get_user_info",
            "unrestrict_link",
            "list_torrents",
            "add_magnet"
        ]
    );
    assert_eq!(
        tools[3]["inputSchema"]["required"],
        json!(["session_id", "link"])
    );
    Ok(())
}

#[tokio::test]
async fn test_device_flow_and_user_info_over_mcp() -> Result<()> {
    let server = TestServer::start().await?;
    server.mount_approving_device_flow("AT", 3600).await;

    Mock::given(method("GET"))
        .and(path(format!("{API_PREFIX}/user")))
        .and(header("authorization", "Bearer AT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "alice",
            "premium": 86400
        })))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let started = call_tool(&server, 1, "oauth_start", json!({})).await?;
    assert!(started.get("isError").is_none());
    let attempt = text_json(&started)?;
    assert_eq!(attempt["device_code"], "DEVICE");
    assert_eq!(attempt["user_code"], "USERCODE");

    let checked = call_tool(
        &server,
        2,
        "oauth_check",
        json!({ "device_code": "DEVICE" }),
    )
    .await?;
    let checked = text_json(&checked)?;
    assert_eq!(checked["status"], "authorized");
    let session_id = checked["session_id"].as_str().unwrap().to_string();

    let health = server.get("/health").await?;
    assert_eq!(health["active_sessions"], 1);

    let user = call_tool(
        &server,
        3,
        "get_user_info",
        json!({ "session_id": session_id }),
    )
    .await?;
    assert!(user.get("isError").is_none());
    assert_eq!(user["content"][0]["type"], "text");
    assert_eq!(text_json(&user)?["username"], "alice");
    Ok(())
}

#[tokio::test]
async fn test_remote_error_is_tool_error_result() -> Result<()> {
    let server = TestServer::start().await?;
    server.mount_approving_device_flow("AT", 3600).await;

    Mock::given(method("POST"))
        .and(path(format!("{API_PREFIX}/unrestrict/link")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "password_protected",
            "error_code": 19
        })))
        .mount(&server.upstream)
        .await;

    let session_id = server.authorize().await?;
    let result = call_tool(
        &server,
        7,
        "unrestrict_link",
        json!({ "session_id": session_id, "link": "https://hoster.example/f/1" }),
    )
    .await?;

    assert_eq!(result["isError"], true);
    assert_eq!(
        result["content"][0]["text"],
        "Real-Debrid API Error: password_protected (Code: 19)"
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_tool_error_result() -> Result<()> {
    let server = TestServer::start().await?;

    let result = call_tool(
        &server,
        1,
        "list_torrents",
        json!({ "session_id": "session_0_unknown" }),
    )
    .await?;

    assert_eq!(result["isError"], true);
    assert!(
        result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("authenticate first")
    );
    assert!(server.upstream.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_protocol_errors() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "delete_account", "arguments": {} }
        }),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["id"], 4);
    assert_eq!(body["error"]["code"], -32602);
    assert!(body.get("result").is_none());

    let (_, body) = rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": 5, "method": "prompts/list" }),
    )
    .await?;
    assert_eq!(body["error"]["code"], -32601);

    let (_, body) = rpc(
        &server,
        json!([{ "jsonrpc": "2.0", "id": 6, "method": "ping" }]),
    )
    .await?;
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], Value::Null);

    let response = server
        .client
        .post(server.url("/mcp"))
        .header("content-type", "application/json")
        .body("{\"jsonrpc\": \"2.0\", ")
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
    Ok(())
}
