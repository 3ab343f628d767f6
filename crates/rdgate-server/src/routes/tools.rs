//! Proxied Real-Debrid tools. Each takes a `session_id` from oauth_check.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServerError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Request carrying only a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

/// Request for unrestrict_link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnrestrictLinkRequest {
    pub session_id: String,
    /// The hoster link to unrestrict.
    pub link: String,
    /// Password for protected files.
    #[serde(default)]
    pub password: Option<String>,
}

/// Request for list_torrents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTorrentsRequest {
    pub session_id: String,
    /// `active` for active torrents only.
    #[serde(default)]
    pub filter: Option<String>,
}

/// Request for add_magnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMagnetRequest {
    pub session_id: String,
    pub magnet: String,
}

fn require(field: &str, value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Fetch the account profile for a session.
pub async fn get_user_info(state: &AppState, request: SessionRequest) -> Result<Value, ServerError> {
    Ok(state.api.user_info(&request.session_id).await?)
}

/// Unrestrict a hoster link, with an optional file password.
pub async fn unrestrict_link(
    state: &AppState,
    request: UnrestrictLinkRequest,
) -> Result<Value, ServerError> {
    require("link", &request.link)?;
    Ok(state
        .api
        .unrestrict_link(
            &request.session_id,
            &request.link,
            request.password.as_deref(),
        )
        .await?)
}

/// List the session's torrents, optionally filtered.
pub async fn list_torrents(
    state: &AppState,
    request: ListTorrentsRequest,
) -> Result<Value, ServerError> {
    Ok(state
        .api
        .list_torrents(&request.session_id, request.filter.as_deref())
        .await?)
}

/// Add a magnet link to the session's torrents.
pub async fn add_magnet(state: &AppState, request: AddMagnetRequest) -> Result<Value, ServerError> {
    require("magnet", &request.magnet)?;
    Ok(state
        .api
        .add_magnet(&request.session_id, &request.magnet)
        .await?)
}

/// POST /tools/get_user_info
pub async fn get_user_info_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SessionRequest>,
) -> Result<Json<Value>, ServerError> {
    get_user_info(&state, request).await.map(Json)
}

/// POST /tools/unrestrict_link
pub async fn unrestrict_link_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UnrestrictLinkRequest>,
) -> Result<Json<Value>, ServerError> {
    unrestrict_link(&state, request).await.map(Json)
}

/// POST /tools/list_torrents
pub async fn list_torrents_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ListTorrentsRequest>,
) -> Result<Json<Value>, ServerError> {
    list_torrents(&state, request).await.map(Json)
}

/// POST /tools/add_magnet
pub async fn add_magnet_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddMagnetRequest>,
) -> Result<Json<Value>, ServerError> {
    add_magnet(&state, request).await.map(Json)
}
