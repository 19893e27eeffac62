// region:    --- Imports
use super::extract::{Json, Path};
use crate::auth::CurrentUser;
use crate::dashboard;
use crate::error::AppResult;
use crate::profiles::{self, ProfileUpdate};
use crate::state::AppState;
use crate::watchlist;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Profile

/// 내 프로필
pub async fn handle_get_me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user)
}

/// 내 프로필 수정
pub async fn handle_update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(profiles::update_profile(&state.db, user.id, update).await?))
}

/// 대시보드
pub async fn handle_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(dashboard::load(&state.db, user).await?))
}

// endregion: --- Profile

// region:    --- Watchlist

pub async fn handle_watchlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 관심 목록 조회 user: {}", "HandlerQuery", user.id);
    Ok(Json(watchlist::list(&state.db, user.id).await?))
}

pub async fn handle_save(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let saved = watchlist::save(&state.db, state.publisher.as_ref(), user.id, auction_id).await?;
    Ok(Json(saved))
}

pub async fn handle_unsave(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let saved = watchlist::remove(&state.db, state.publisher.as_ref(), user.id, auction_id).await?;
    Ok(Json(saved))
}

pub async fn handle_toggle_saved(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let saved = watchlist::toggle(&state.db, state.publisher.as_ref(), user.id, auction_id).await?;
    Ok(Json(saved))
}

// endregion: --- Watchlist
