//! Error types for the OAuth and session layer.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while authorizing or using a session.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The session id is unknown to this process.
    #[error(
        "Invalid session_id. Please authenticate first using oauth_start and oauth_check."
    )]
    InvalidSession,

    /// The remote service rejected the request. Message and code are the
    /// remote's own, unmodified.
    #[error("Real-Debrid API Error: {message} (Code: {})", display_code(.code))]
    Upstream { message: String, code: Option<i64> },

    /// Network/HTTP error, including timeouts.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote answered with a payload we could not understand.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

fn display_code(code: &Option<i64>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Error body returned by Real-Debrid on failure.
#[derive(Debug, serde::Deserialize)]
struct RemoteError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl OAuthError {
    /// Build an upstream error from a failure response body, keeping the
    /// remote `error`/`error_code` verbatim when present.
    pub fn from_remote_body(body: &str, fallback: &str) -> Self {
        match serde_json::from_str::<RemoteError>(body) {
            Ok(RemoteError {
                error: Some(message),
                error_code,
            }) => OAuthError::upstream(message, error_code),
            Ok(RemoteError { error_code, .. }) => OAuthError::upstream(fallback, error_code),
            Err(_) if body.trim().is_empty() => OAuthError::upstream(fallback, None),
            Err(_) => OAuthError::upstream(format!("{}: {}", fallback, body.trim()), None),
        }
    }

    /// Build an upstream error from a remote message and optional code.
    pub fn upstream(message: impl Into<String>, code: Option<i64>) -> Self {
        OAuthError::Upstream {
            message: message.into(),
            code,
        }
    }

    /// True for every failure that originated at (or on the way to) the
    /// remote service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            OAuthError::Upstream { .. } | OAuthError::Network(_) | OAuthError::Serialization(_)
        )
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            OAuthError::Serialization(e.to_string())
        } else if e.is_timeout() {
            OAuthError::Network(format!("Request timed out: {}", e))
        } else {
            OAuthError::Network(e.to_string())
        }
    }
}
