//! Session lifecycle: device-flow authorization and refresh-on-demand.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{OAuthError, Result};
use crate::oauth::SharedOAuthClient;
use crate::token_store::{SessionCredentials, TokenStore};

const NOT_AUTHORIZED_MESSAGE: &str =
    "User has not authorized yet. Please complete authorization at real-debrid.com/device";

const IN_PROGRESS_MESSAGE: &str = "Authorization in progress. Please try again in a few seconds.";

/// Everything a caller needs to drive one device authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthAttempt {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    pub interval: u64,
    /// Human-readable "go here, enter this" line.
    pub message: String,
    pub instructions: String,
}

/// Outcome of one `check_auth` poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuthStatus {
    Pending { message: String },
    Authorized { session_id: String, expires_in: u64 },
}

impl AuthStatus {
    fn pending(message: &str) -> Self {
        AuthStatus::Pending {
            message: message.to_string(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            AuthStatus::Authorized { session_id, .. } => Some(session_id),
            AuthStatus::Pending { .. } => None,
        }
    }
}

/// Yields a currently valid access token for a session.
#[async_trait]
pub trait AccessTokenSource: Send + Sync + std::fmt::Debug {
    async fn access_token(&self, session_id: &str) -> Result<String>;
}

/// Shared token source for use across async contexts.
pub type SharedAccessTokenSource = Arc<dyn AccessTokenSource>;

/// Orchestrates the device flow and keeps session tokens fresh.
#[derive(Debug, Clone)]
pub struct SessionManager {
    oauth: SharedOAuthClient,
    store: TokenStore,
}

impl SessionManager {
    pub fn new(oauth: SharedOAuthClient) -> Self {
        Self {
            oauth,
            store: TokenStore::new(),
        }
    }

    /// Number of sessions currently held.
    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// Start a device authorization. Stores nothing locally.
    pub async fn begin_auth(&self) -> Result<AuthAttempt> {
        let device = self.oauth.start_device_flow().await?;
        let message = format!(
            "Go to {} and enter code: {}",
            device.verification_url, device.user_code
        );

        Ok(AuthAttempt {
            device_code: device.device_code,
            user_code: device.user_code,
            verification_url: device.verification_url,
            expires_in: device.expires_in,
            interval: device.interval,
            message,
            instructions: "Then use oauth_check with the device_code to complete authentication"
                .to_string(),
        })
    }

    /// Poll a device authorization once. A pending result leaves the store
    /// untouched.
    pub async fn check_auth(&self, device_code: &str) -> Result<AuthStatus> {
        let Some(client) = self.oauth.poll_credentials(device_code).await? else {
            return Ok(AuthStatus::pending(NOT_AUTHORIZED_MESSAGE));
        };

        let Some(grant) = self.oauth.exchange_token(&client, device_code).await? else {
            return Ok(AuthStatus::pending(IN_PROGRESS_MESSAGE));
        };

        let expires_in = grant.expires_in;
        let credentials = SessionCredentials::from_grant(grant, client, Instant::now())?;

        let session_id = loop {
            let candidate = generate_session_id();
            if self.store.insert_new(&candidate, credentials.clone()) {
                break candidate;
            }
            tracing::warn!("Session id collision, regenerating");
        };

        tracing::info!(
            expires_in,
            active_sessions = self.store.len(),
            "Session authorized"
        );
        Ok(AuthStatus::Authorized {
            session_id,
            expires_in,
        })
    }

    /// Return the session's access token, refreshing it first if expired.
    ///
    /// Concurrent callers for the same session queue on the session's lock,
    /// so an expired token is refreshed once and everyone gets the new one.
    pub async fn get_valid_token(&self, session_id: &str) -> Result<String> {
        let entry = self
            .store
            .entry(session_id)
            .ok_or(OAuthError::InvalidSession)?;
        let mut record = entry.lock().await;

        if !record.is_expired(Instant::now()) {
            return Ok(record.access_token.clone());
        }

        tracing::info!("Access token expired, refreshing");
        let mut grant = self
            .oauth
            .refresh_token(&record.client, &record.refresh_token)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    error = %e,
                    upstream = e.is_upstream(),
                    "Token refresh failed, session must re-authorize"
                );
            })?;

        if grant.refresh_token.is_empty() {
            grant.refresh_token = record.refresh_token.clone();
        }

        let client = record.client.clone();
        *record = SessionCredentials::from_grant(grant, client, Instant::now())?;
        tracing::info!("Token refreshed successfully");
        Ok(record.access_token.clone())
    }
}

#[async_trait]
impl AccessTokenSource for SessionManager {
    async fn access_token(&self, session_id: &str) -> Result<String> {
        self.get_valid_token(session_id).await
    }
}

/// `session_<unix seconds>_<128 random bits, base64url>`.
fn generate_session_id() -> String {
    let mut suffix = [0u8; 16];
    rand::rng().fill_bytes(&mut suffix);
    format!(
        "session_{}_{}",
        chrono::Utc::now().timestamp(),
        URL_SAFE_NO_PAD.encode(suffix)
    )
}
