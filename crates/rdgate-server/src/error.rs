//! Error types for the server.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rdgate_oauth::OAuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Unknown session; the caller has to authenticate first.
    #[error(
        "Invalid session_id. Please authenticate first using oauth_start and oauth_check."
    )]
    InvalidSession,

    /// The remote service returned an error. Message and code are passed
    /// through unmodified.
    #[error("Real-Debrid API Error: {message} (Code: {})", display_code(.code))]
    Upstream { message: String, code: Option<i64> },

    /// The remote service could not be reached or timed out.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn display_code(code: &Option<i64>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string())
}

impl From<OAuthError> for ServerError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::InvalidSession => ServerError::InvalidSession,
            OAuthError::Upstream { message, code } => ServerError::Upstream { message, code },
            OAuthError::Network(msg) => ServerError::Unavailable(msg),
            OAuthError::Serialization(msg) => ServerError::Upstream {
                message: format!("Malformed response: {}", msg),
                code: None,
            },
            OAuthError::Config(msg) => ServerError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Remote error identifier, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remote numeric error code, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::InvalidSession => (StatusCode::UNAUTHORIZED, "invalid_session"),
            ServerError::Upstream { .. } | ServerError::Unavailable(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = self.to_string();

        match &self {
            ServerError::Internal(_) => {
                tracing::error!(status = %status, code, error = %message, "Server error");
            }
            _ => {
                tracing::warn!(status = %status, code, error = %message, "Request failed");
            }
        }

        let (error, error_code) = match self {
            ServerError::Upstream { message, code } => (Some(message), code),
            _ => (None, None),
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
            error,
            error_code,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ServerError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_error_preserves_remote_fields() {
        let err: ServerError = OAuthError::upstream("password_protected", Some(19)).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "upstream_error");
        assert_eq!(body.error.as_deref(), Some("password_protected"));
        assert_eq!(body.error_code, Some(19));
        assert_eq!(
            body.message,
            "Real-Debrid API Error: password_protected (Code: 19)"
        );
    }

    #[tokio::test]
    async fn test_invalid_session_tells_caller_to_authenticate() {
        let err: ServerError = OAuthError::InvalidSession.into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "invalid_session");
        assert!(body.message.contains("authenticate first"));
        assert!(body.error.is_none());
    }

    #[tokio::test]
    async fn test_network_failure_is_upstream_error() {
        let err: ServerError = OAuthError::Network("Request timed out".into()).into();
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.code, "upstream_error");
    }

    #[test]
    fn test_oauth_error_mapping() {
        assert!(matches!(
            ServerError::from(OAuthError::Serialization("eof".into())),
            ServerError::Upstream { code: None, .. }
        ));
        assert!(matches!(
            ServerError::from(OAuthError::Config("x".into())),
            ServerError::Internal(_)
        ));
    }
}
