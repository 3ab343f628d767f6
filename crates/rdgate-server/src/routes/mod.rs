//! HTTP routes.

pub mod auth;
pub mod health;
pub mod mcp;
pub mod tools;

pub use auth::{OAuthCheckRequest, OAuthCheckResponse, oauth_check_handler, oauth_start_handler};
pub use health::{HealthResponse, health_handler, root_handler};
pub use mcp::mcp_handler;
pub use tools::{
    AddMagnetRequest, ListTorrentsRequest, SessionRequest, UnrestrictLinkRequest,
    add_magnet_handler, get_user_info_handler, list_torrents_handler, unrestrict_link_handler,
};

/// Callable tools, in the order they are advertised.
pub const TOOLS: &[(&str, &str)] = &[
    (
        "oauth_start",
        "Start OAuth device code flow - returns a code for the user to enter at real-debrid.com/device",
    ),
    (
        "oauth_check",
        "Check if OAuth authorization is complete and get a session_id",
    ),
    ("get_user_info", "Get current Real-Debrid user information"),
    ("unrestrict_link", "Unrestrict a hoster link"),
    ("list_torrents", "Get user's torrents list"),
    ("add_magnet", "Add a magnet link"),
];
