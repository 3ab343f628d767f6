//! Per-session credential storage.
//!
//! The map itself sits behind a short-lived `parking_lot` lock. Each record
//! lives behind its own async mutex, which is what serializes the
//! check-refresh-write sequence for one session without blocking others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{OAuthError, Result};
use crate::oauth::{ClientCredentials, TokenGrant};

/// Credentials held for one authorized session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: String,
    /// The access token must not be used at or after this instant.
    pub expires_at: Instant,
    /// Client credentials issued for this authorization.
    pub client: ClientCredentials,
}

impl SessionCredentials {
    /// Build a record from a fresh token grant.
    ///
    /// Fails when `expires_in` is too large to represent as an instant.
    pub fn from_grant(grant: TokenGrant, client: ClientCredentials, now: Instant) -> Result<Self> {
        let expires_at = now
            .checked_add(Duration::from_secs(grant.expires_in))
            .ok_or_else(|| {
                OAuthError::Serialization(format!("invalid expires_in: {}", grant.expires_in))
            })?;

        Ok(Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at,
            client,
        })
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Handle to one session's record. Hold the lock for the whole
/// read-check-refresh-write sequence.
pub type SessionEntry = Arc<Mutex<SessionCredentials>>;

/// Process-wide map from session id to credentials.
///
/// Cloning the store clones the handle, not the data.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under a new id. Returns `false` and leaves the store
    /// untouched if the id is already taken.
    pub fn insert_new(&self, session_id: &str, credentials: SessionCredentials) -> bool {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(session_id) {
            return false;
        }
        sessions.insert(session_id.to_string(), Arc::new(Mutex::new(credentials)));
        true
    }

    /// Get the lockable entry for a session.
    pub fn entry(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
