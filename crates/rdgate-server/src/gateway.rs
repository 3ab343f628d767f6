//! Real-Debrid REST client authenticated per session.
//!
//! Every call first asks the token source for a valid access token, which
//! may refresh the session's credentials as a side effect.

use std::time::Duration;

use rdgate_oauth::{OAuthError, Result, SharedAccessTokenSource};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

/// Proxy for the Real-Debrid REST API.
#[derive(Debug, Clone)]
pub struct DebridApi {
    client: Client,
    base_url: String,
    tokens: SharedAccessTokenSource,
}

impl DebridApi {
    /// Create an API proxy with its own connection pool.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: SharedAccessTokenSource,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OAuthError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Issue one authenticated request.
    ///
    /// Non-GET requests send `form` as `application/x-www-form-urlencoded`.
    /// A 204 yields `{"success": true}`; any status >= 400 becomes
    /// [`OAuthError::Upstream`] with the remote message and code.
    pub async fn request(
        &self,
        session_id: &str,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> Result<Value> {
        let token = self.tokens.access_token(session_id).await?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut req = self.client.request(method.clone(), &url).bearer_auth(&token);
        if !query.is_empty() {
            req = req.query(query);
        }
        if method != Method::GET {
            req = req.form(form);
        }

        let response = req.send().await?;
        let status = response.status();
        tracing::debug!(%method, path, %status, "Real-Debrid API response");

        if status == StatusCode::NO_CONTENT {
            return Ok(success_sentinel());
        }

        let body = response.text().await?;

        if status.as_u16() >= 400 {
            return Err(OAuthError::from_remote_body(&body, "Unknown error"));
        }
        if !status.is_success() {
            return Err(OAuthError::Serialization(format!(
                "Unexpected status {} from {}",
                status, path
            )));
        }
        if body.trim().is_empty() {
            return Ok(success_sentinel());
        }

        serde_json::from_str(&body)
            .map_err(|e| OAuthError::Serialization(format!("Failed to parse response: {}", e)))
    }

    /// GET /user
    pub async fn user_info(&self, session_id: &str) -> Result<Value> {
        self.request(session_id, Method::GET, "/user", &[], &[]).await
    }

    /// POST /unrestrict/link
    pub async fn unrestrict_link(
        &self,
        session_id: &str,
        link: &str,
        password: Option<&str>,
    ) -> Result<Value> {
        let mut form = vec![("link", link)];
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            form.push(("password", password));
        }
        self.request(session_id, Method::POST, "/unrestrict/link", &[], &form)
            .await
    }

    /// GET /torrents, optionally filtered (e.g. `active`).
    pub async fn list_torrents(&self, session_id: &str, filter: Option<&str>) -> Result<Value> {
        let query: Vec<(&str, &str)> = filter
            .filter(|f| !f.is_empty())
            .map(|f| vec![("filter", f)])
            .unwrap_or_default();
        self.request(session_id, Method::GET, "/torrents", &query, &[]).await
    }

    /// POST /torrents/addMagnet
    pub async fn add_magnet(&self, session_id: &str, magnet: &str) -> Result<Value> {
        self.request(
            session_id,
            Method::POST,
            "/torrents/addMagnet",
            &[],
            &[("magnet", magnet)],
        )
        .await
    }
}

fn success_sentinel() -> Value {
    serde_json::json!({ "success": true })
}
