use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::{Comment, CommentUpdate};
use serde::Deserialize;
use services::AppError;

use crate::http::{
    auth::{AdminAuth, MaybeAdmin},
    error::{ApiJson, ApiQuery, ApiResult},
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub id: String,
    #[serde(flatten)]
    pub update: CommentUpdate,
}

#[derive(Deserialize)]
pub struct DeleteCommentRequest {
    pub id: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Response> {
    if query.action.as_deref() == Some("stats") {
        if !is_admin {
            return Err(AppError::Unauthorized("Admin token required".to_string()).into());
        }
        return Ok(Json(state.comments.stats().await?).into_response());
    }

    let listing = state
        .comments
        .list(query.page, query.limit, is_admin)
        .await?;
    Ok(Json(listing).into_response())
}

pub async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let ip = client_ip(&headers, payload.ip.as_deref(), peer.map(|ConnectInfo(addr)| addr));
    let comment = state
        .comments
        .submit(&payload.name, &payload.content, &ip)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let comment = state.comments.update(&payload.id, payload.update).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<DeleteCommentRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.comments.delete(&payload.id).await?;
    Ok(Json(serde_json::json!({ "message": "Comment deleted" })))
}

/// Proxy headers first, then what the page reported, then the socket.
fn client_ip(headers: &HeaderMap, reported: Option<&str>, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            reported
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
