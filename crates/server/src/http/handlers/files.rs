use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{Folder, FolderInput};
use serde::Deserialize;

use crate::http::{
    auth::AdminAuth,
    error::{ApiJson, ApiResult},
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateFolderRequest {
    pub file: FolderInput,
}

/// The three shapes the console sends to `PUT /files`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum UpdateFilesRequest {
    Replace {
        index: usize,
        file: FolderInput,
    },
    ReplaceAll {
        #[serde(rename = "filesList")]
        files_list: Vec<FolderInput>,
    },
    Reorder {
        from: usize,
        to: usize,
    },
}

#[derive(Deserialize)]
pub struct DeleteFolderRequest {
    pub index: usize,
}

pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<Folder>>> {
    Ok(Json(state.files.list_folders().await?))
}

pub async fn create_folder(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<CreateFolderRequest>,
) -> ApiResult<(StatusCode, Json<Folder>)> {
    let folder = state.files.create_folder(payload.file).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn update_files(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<UpdateFilesRequest>,
) -> ApiResult<Response> {
    let response = match payload {
        UpdateFilesRequest::Replace { index, file } => {
            Json(state.files.update_folder(index, file).await?).into_response()
        }
        UpdateFilesRequest::ReplaceAll { files_list } => {
            let count = state.files.replace_all(files_list).await?;
            Json(serde_json::json!({ "message": "Files updated", "count": count }))
                .into_response()
        }
        UpdateFilesRequest::Reorder { from, to } => {
            state.files.reorder(from, to).await?;
            Json(serde_json::json!({ "message": "Folders reordered" })).into_response()
        }
    };
    Ok(response)
}

pub async fn delete_folder(
    State(state): State<AppState>,
    _admin: AdminAuth,
    ApiJson(payload): ApiJson<DeleteFolderRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.files.delete_folder(payload.index).await?;
    Ok(Json(serde_json::json!({ "message": "Folder deleted" })))
}
