// region:    --- Imports
use super::extract::{Json, Path};
use crate::auction::submission::SubmissionForm;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::state::AppState;
use crate::submissions::SubmissionDesk;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

fn desk(state: &AppState) -> SubmissionDesk<'_> {
    SubmissionDesk {
        db_manager: &state.db,
        publisher: state.publisher.as_ref(),
        storage: state.storage.as_ref(),
        mailer: state.mailer.as_ref(),
        config: &state.config,
    }
}

/// 출품
pub async fn handle_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<SubmissionForm>,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 출품 요청 user: {}", "Command", user.id);
    let auction = desk(&state).submit(&user, form).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// 출품 수정
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<SubmissionForm>,
) -> AppResult<impl IntoResponse> {
    let auction = desk(&state).edit(&user, auction_id, form).await?;
    Ok(Json(auction))
}

/// 출품 철회
pub async fn handle_withdraw(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    desk(&state).withdraw(&user, auction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 재출품 양식
pub async fn handle_resubmission_draft(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let draft = desk(&state).resubmission_draft(&user, auction_id).await?;
    Ok(Json(draft))
}
