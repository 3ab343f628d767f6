//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use rdgate_server::{Server, ServerConfig};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// OAuth paths are mounted under this prefix on the mock upstream.
pub const OAUTH_PREFIX: &str = "/oauth/v2";

/// REST API paths are mounted under this prefix on the mock upstream.
pub const API_PREFIX: &str = "/rest/1.0";

/// A running rdgate server backed by a mock Real-Debrid.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Mock Real-Debrid (OAuth + REST).
    pub upstream: MockServer,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    /// Start a server with no upstream expectations mounted yet.
    pub async fn start() -> Result<Self> {
        let upstream = MockServer::start().await;

        let config = ServerConfig::new()
            .with_bind_address("127.0.0.1:0".parse()?)
            .with_oauth_base_url(format!("{}{}", upstream.uri(), OAUTH_PREFIX))
            .with_api_base_url(format!("{}{}", upstream.uri(), API_PREFIX))
            .with_timeout(Duration::from_secs(5));

        let (tx, rx) = oneshot::channel::<()>();
        let server = Server::new(config)?;
        let addr = server
            .run_with_shutdown(async move {
                let _ = rx.await;
            })
            .await?;

        Ok(Self {
            addr,
            client: Client::new(),
            upstream,
            _shutdown: tx,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a tool call and return status plus JSON body.
    pub async fn call(&self, tool: &str, args: Value) -> Result<(u16, Value)> {
        let response = self
            .client
            .post(self.url(&format!("/tools/{}", tool)))
            .json(&args)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.json().await?;
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        Ok(self.client.get(self.url(path)).send().await?.json().await?)
    }

    /// Mount a device flow that approves immediately and issues `access_token`.
    pub async fn mount_approving_device_flow(&self, access_token: &str, expires_in: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{OAUTH_PREFIX}/device/code")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device_code": "DEVICE",
                "user_code": "USERCODE",
                "verification_url": "https://real-debrid.com/device",
                "expires_in": 600,
                "interval": 5
            })))
            .mount(&self.upstream)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{OAUTH_PREFIX}/device/credentials")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "client_id": "issued-client",
                "client_secret": "issued-secret"
            })))
            .mount(&self.upstream)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{OAUTH_PREFIX}/token")))
            .and(body_string_contains("code=DEVICE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "refresh_token": "refresh-1",
                "expires_in": expires_in,
                "token_type": "Bearer"
            })))
            .mount(&self.upstream)
            .await;
    }

    /// Run oauth_check against an approving flow and return the session id.
    pub async fn authorize(&self) -> Result<String> {
        let (status, body) = self
            .call("oauth_check", json!({ "device_code": "DEVICE" }))
            .await?;
        anyhow::ensure!(status == 200, "oauth_check failed: {status} {body}");
        anyhow::ensure!(body["status"] == "authorized", "not authorized: {body}");
        body["session_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing session_id: {body}"))
    }
}
