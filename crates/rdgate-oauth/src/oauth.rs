//! OAuth 2.0 device authorization flow for Real-Debrid.
//!
//! Every call here is a single remote round trip. Nothing waits for the
//! user: "not yet approved" comes back as `None` and the caller decides when
//! to poll again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};

/// Real-Debrid OAuth base URL.
pub const REAL_DEBRID_OAUTH_URL: &str = "https://api.real-debrid.com/oauth/v2";

/// Public client id for open-source applications.
pub const DEFAULT_CLIENT_ID: &str = "X245A4XAIBGVM";

/// Grant type used for both the device-code exchange and refresh.
pub const DEVICE_GRANT_TYPE: &str = "http://oauth.net/grant_type/device/1.0";

/// Default timeout for every OAuth request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// OAuth configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::real_debrid()
    }
}

impl OAuthConfig {
    /// OAuth config for the public Real-Debrid endpoints.
    pub fn real_debrid() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            base_url: REAL_DEBRID_OAUTH_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at another OAuth base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Device/user code pair returned when a device flow starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    pub interval: u64,
}

/// Per-authorization client credentials issued once the user approves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Tokens issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Empty when the server did not rotate the refresh token.
    #[serde(default)]
    pub refresh_token: String,
    pub expires_in: u64,
}

// ============================================================================
// OAuthClient Trait
// ============================================================================

/// The four remote steps of the device authorization grant.
#[async_trait]
pub trait OAuthClient: Send + Sync + std::fmt::Debug {
    /// Request a new device/user code pair.
    async fn start_device_flow(&self) -> Result<DeviceCode>;

    /// Poll for client credentials. `None` while the user has not approved.
    async fn poll_credentials(&self, device_code: &str) -> Result<Option<ClientCredentials>>;

    /// Exchange the device code for tokens. `None` while no token is issued yet.
    async fn exchange_token(
        &self,
        credentials: &ClientCredentials,
        device_code: &str,
    ) -> Result<Option<TokenGrant>>;

    /// Mint a new access token. Any rejection is fatal for the session.
    async fn refresh_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant>;
}

/// Shared OAuth client for use across async contexts.
pub type SharedOAuthClient = Arc<dyn OAuthClient>;

// ============================================================================
// RealDebridOAuth
// ============================================================================

/// HTTP implementation of [`OAuthClient`] against Real-Debrid.
#[derive(Debug, Clone)]
pub struct RealDebridOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    grant_type: &'a str,
}

impl RealDebridOAuth {
    /// Create a client with its own connection pool.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OAuthError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn post_token(&self, request: &TokenRequest<'_>) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.config.endpoint("token"))
            .form(request)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl OAuthClient for RealDebridOAuth {
    async fn start_device_flow(&self) -> Result<DeviceCode> {
        let response = self
            .http
            .get(self.config.endpoint("device/code"))
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("new_credentials", "yes"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Device code request rejected");
            return Err(OAuthError::from_remote_body(&body, "Device code request failed"));
        }

        let device: DeviceCode = response.json().await.map_err(|e| {
            OAuthError::Serialization(format!("Failed to parse device code response: {}", e))
        })?;
        tracing::debug!(expires_in = device.expires_in, "Device flow started");
        Ok(device)
    }

    async fn poll_credentials(&self, device_code: &str) -> Result<Option<ClientCredentials>> {
        let response = self
            .http
            .get(self.config.endpoint("device/credentials"))
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("code", device_code),
            ])
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = %response.status(), "Device not yet authorized");
            return Ok(None);
        }

        let credentials = response.json().await.map_err(|e| {
            OAuthError::Serialization(format!("Failed to parse credentials response: {}", e))
        })?;
        Ok(Some(credentials))
    }

    async fn exchange_token(
        &self,
        credentials: &ClientCredentials,
        device_code: &str,
    ) -> Result<Option<TokenGrant>> {
        let response = self
            .post_token(&TokenRequest {
                client_id: &credentials.client_id,
                client_secret: &credentials.client_secret,
                code: device_code,
                grant_type: DEVICE_GRANT_TYPE,
            })
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = %response.status(), "Token not yet issued");
            return Ok(None);
        }

        let grant = response.json().await.map_err(|e| {
            OAuthError::Serialization(format!("Failed to parse token response: {}", e))
        })?;
        Ok(Some(grant))
    }

    async fn refresh_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant> {
        let response = self
            .post_token(&TokenRequest {
                client_id: &credentials.client_id,
                client_secret: &credentials.client_secret,
                code: refresh_token,
                grant_type: DEVICE_GRANT_TYPE,
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Token refresh rejected");
            return Err(OAuthError::from_remote_body(&body, "Token refresh failed"));
        }

        response.json().await.map_err(|e| {
            OAuthError::Serialization(format!("Failed to parse refresh response: {}", e))
        })
    }
}
