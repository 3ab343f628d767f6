//! Real-Debrid OAuth device flow and session token lifecycle.
//!
//! # Components
//!
//! - [`oauth`]: the four remote device-flow calls (start, poll, exchange, refresh)
//! - [`token_store`]: per-session credential records with per-session locking
//! - [`session`]: device-flow orchestration and refresh-on-demand

pub mod error;
pub mod oauth;
pub mod session;
pub mod token_store;

pub use error::{OAuthError, Result};
pub use oauth::{
    ClientCredentials, DeviceCode, OAuthClient, OAuthConfig, RealDebridOAuth, SharedOAuthClient,
    TokenGrant,
};
pub use session::{
    AccessTokenSource, AuthAttempt, AuthStatus, SessionManager, SharedAccessTokenSource,
};
pub use token_store::{SessionCredentials, TokenStore};
