use axum::{extract::State, Json};
use serde::Deserialize;

use crate::http::{
    auth::AdminAuth,
    error::{ApiJson, ApiResult},
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = state
        .auth
        .login(payload.username.trim(), &payload.password)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "token": token })))
}

pub async fn change_password(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .auth
        .change_password(&payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "message": "Password updated" }),
    ))
}
