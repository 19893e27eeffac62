// region:    --- Imports
use super::extract::{Json, Path};
use crate::auth::AdminUser;
use crate::catalog::{self, CategoryForm};
use crate::error::AppResult;
use crate::moderation::{self, CommentsRequest, Moderator, RejectRequest};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

fn moderator(state: &AppState) -> Moderator<'_> {
    Moderator {
        db_manager: &state.db,
        publisher: state.publisher.as_ref(),
        mailer: state.mailer.as_ref(),
    }
}

// region:    --- Moderation

/// 관리자 경매 목록
pub async fn handle_overview(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 관리자 경매 목록 조회 admin: {}", "HandlerQuery", admin.id);
    Ok(Json(moderation::overview(&state.db).await?))
}

/// 재출품 비교
pub async fn handle_comparison(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(_admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderation::comparison(&state.db, auction_id).await?))
}

pub async fn handle_approve(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderator(&state).approve(&admin, auction_id).await?))
}

pub async fn handle_reject(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
    Json(request): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderator(&state).reject(&admin, auction_id, request).await?))
}

pub async fn handle_start(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderator(&state).start(&admin, auction_id).await?))
}

pub async fn handle_pause(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderator(&state).pause(&admin, auction_id).await?))
}

/// 비교 코멘트 저장
pub async fn handle_comments(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CommentsRequest>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderation::save_comments(&state.db, auction_id, request).await?))
}

/// 관리자 활동 기록
pub async fn handle_activity(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(moderation::recent_activity(&state.db).await?))
}

// endregion: --- Moderation

// region:    --- Categories

pub async fn handle_list_categories(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(catalog::list_all(&state.db).await?))
}

pub async fn handle_create_category(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(form): Json<CategoryForm>,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 카테고리 생성 요청 admin: {}", "Command", admin.id);
    let category = catalog::create_category(&state.db, state.publisher.as_ref(), form).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn handle_update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    AdminUser(_admin): AdminUser,
    Json(form): Json<CategoryForm>,
) -> AppResult<impl IntoResponse> {
    let category =
        catalog::update_category(&state.db, state.publisher.as_ref(), category_id, form).await?;
    Ok(Json(category))
}

pub async fn handle_delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    AdminUser(_admin): AdminUser,
) -> AppResult<impl IntoResponse> {
    catalog::delete_category(&state.db, state.publisher.as_ref(), category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Categories
