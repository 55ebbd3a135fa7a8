use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use domain::{Child, ChildInput};
use serde::Deserialize;

use crate::http::{
    auth::AdminAuth,
    error::{ApiJson, ApiQuery, ApiResult},
};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderQuery {
    pub folder_index: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChildRequest {
    pub folder_index: usize,
    pub file: ChildInput,
    #[serde(default)]
    pub at_start: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChildRequest {
    pub folder_index: usize,
    pub file_index: usize,
    pub file: ChildInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteChildRequest {
    pub folder_index: usize,
    pub file_index: usize,
}

pub async fn list_children(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiQuery(query): ApiQuery<FolderQuery>,
) -> ApiResult<Json<Vec<Child>>> {
    Ok(Json(state.files.list_children(query.folder_index).await?))
}

pub async fn add_child(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<AddChildRequest>,
) -> ApiResult<(StatusCode, Json<Child>)> {
    let child = state
        .files
        .add_child(payload.folder_index, payload.file, payload.at_start)
        .await?;
    Ok((StatusCode::CREATED, Json(child)))
}

pub async fn update_child(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<UpdateChildRequest>,
) -> ApiResult<Json<Child>> {
    let child = state
        .files
        .update_child(payload.folder_index, payload.file_index, payload.file)
        .await?;
    Ok(Json(child))
}

pub async fn delete_child(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<DeleteChildRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .files
        .delete_child(payload.folder_index, payload.file_index)
        .await?;
    Ok(Json(serde_json::json!({ "message": "File deleted" })))
}
