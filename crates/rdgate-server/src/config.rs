//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use rdgate_oauth::OAuthConfig;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Real-Debrid REST API base URL.
pub const REAL_DEBRID_API_URL: &str = "https://api.real-debrid.com/rest/1.0";

/// Default timeout for proxied API requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Base URL of the proxied REST API.
    pub api_base_url: String,

    /// Timeout applied to each proxied API request.
    pub request_timeout: Duration,

    /// OAuth endpoints and client id.
    pub oauth: OAuthConfig,

    /// Allow cross-origin requests from any origin.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            api_base_url: REAL_DEBRID_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            oauth: OAuthConfig::default(),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set only the port, keeping the bind IP.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_address.set_port(port);
        self
    }

    /// Point the proxied API at another base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the OAuth client at another base URL.
    pub fn with_oauth_base_url(mut self, url: impl Into<String>) -> Self {
        self.oauth = self.oauth.with_base_url(url);
        self
    }

    /// Set the timeout for both OAuth and API requests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self.oauth = self.oauth.with_timeout(timeout);
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.enable_cors = enabled;
        self
    }
}
