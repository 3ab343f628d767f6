//! Application state shared across handlers.

use std::sync::Arc;

use rdgate_oauth::{RealDebridOAuth, SessionManager, SharedOAuthClient};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::gateway::DebridApi;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Device-flow orchestration and the session token store.
    pub sessions: SessionManager,

    /// Authenticated Real-Debrid API proxy.
    pub api: Arc<DebridApi>,
}

impl AppState {
    /// Create state talking to the configured Real-Debrid endpoints.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let oauth = RealDebridOAuth::new(config.oauth.clone())?;
        Self::with_oauth_client(config, Arc::new(oauth))
    }

    /// Create state with a custom OAuth client.
    pub fn with_oauth_client(config: ServerConfig, oauth: SharedOAuthClient) -> Result<Self> {
        let sessions = SessionManager::new(oauth);
        let api = DebridApi::new(
            config.api_base_url.clone(),
            config.request_timeout,
            Arc::new(sessions.clone()),
        )?;

        Ok(Self {
            config: Arc::new(config),
            sessions,
            api: Arc::new(api),
        })
    }

    /// Number of authorized sessions held by this process.
    pub fn active_sessions(&self) -> usize {
        self.sessions.active_sessions()
    }
}
