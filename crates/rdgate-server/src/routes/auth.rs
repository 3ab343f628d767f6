//! Device-flow authorization tools.

use axum::{Json, extract::State};
use rdgate_oauth::{AuthAttempt, AuthStatus};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::extract::ApiJson;
use crate::state::AppState;

const AUTHORIZED_MESSAGE: &str =
    "Successfully authorized! Use this session_id for all other tools.";

/// Request for oauth_check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCheckRequest {
    /// Device code from oauth_start.
    pub device_code: String,
}

/// Response for oauth_check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthCheckResponse {
    /// `pending` or `authorized`.
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl From<AuthStatus> for OAuthCheckResponse {
    fn from(status: AuthStatus) -> Self {
        match status {
            AuthStatus::Pending { message } => Self {
                status: "pending".to_string(),
                message,
                session_id: None,
                expires_in: None,
            },
            AuthStatus::Authorized {
                session_id,
                expires_in,
            } => Self {
                status: "authorized".to_string(),
                message: AUTHORIZED_MESSAGE.to_string(),
                session_id: Some(session_id),
                expires_in: Some(expires_in),
            },
        }
    }
}

/// Begin a device authorization.
pub async fn oauth_start(state: &AppState) -> Result<AuthAttempt, ServerError> {
    let attempt = state.sessions.begin_auth().await?;
    tracing::info!(
        expires_in = attempt.expires_in,
        interval = attempt.interval,
        "Device authorization started"
    );
    Ok(attempt)
}

/// Poll a device authorization once.
pub async fn oauth_check(
    state: &AppState,
    request: OAuthCheckRequest,
) -> Result<OAuthCheckResponse, ServerError> {
    let device_code = request.device_code.trim();
    if device_code.is_empty() {
        return Err(ServerError::BadRequest("device_code is required".to_string()));
    }

    let status = state.sessions.check_auth(device_code).await?;
    tracing::debug!(
        authorized = status.session_id().is_some(),
        "Device authorization polled"
    );
    Ok(status.into())
}

/// POST /tools/oauth_start
pub async fn oauth_start_handler(
    State(state): State<AppState>,
) -> Result<Json<AuthAttempt>, ServerError> {
    oauth_start(&state).await.map(Json)
}

/// POST /tools/oauth_check
pub async fn oauth_check_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OAuthCheckRequest>,
) -> Result<Json<OAuthCheckResponse>, ServerError> {
    oauth_check(&state, request).await.map(Json)
}
