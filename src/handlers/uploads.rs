// region:    --- Imports
use super::extract::{Json, Query};
use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::media::{object_path, validate_upload};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
    pub draft_id: String,
    #[serde(default)]
    pub index: usize,
}

/// 이미지 업로드
/// 바디는 파일 내용 그대로, 타입은 Content-Type 헤더로 받는다.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .ok_or_else(|| AppError::validation("Content-Type 헤더가 필요합니다."))?;
    validate_upload(body.len(), &mime, &state.config.uploads)?;

    let path = object_path(
        user.id,
        &query.draft_id,
        query.index,
        &query.file_name,
        &mime,
        Utc::now(),
    );
    info!("{:<12} --> 이미지 업로드 요청 path: {}", "Command", path);
    let stored = state.storage.upload(&path, &mime, body.to_vec()).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
