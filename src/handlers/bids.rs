// region:    --- Imports
use super::extract::{Json, Path};
use crate::auth::{CurrentUser, MaybeUser};
use crate::bidding::commands::{handle_place_bid as command_place_bid, PlaceBidCommand};
use crate::bidding::model::bid_history;
use crate::error::AppResult;
use crate::query::handlers;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    CurrentUser(bidder): CurrentUser,
    Json(cmd): Json<PlaceBidCommand>,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let outcome = command_place_bid(
        &state.db,
        state.publisher.as_ref(),
        &state.config.bidding,
        &bidder,
        auction_id,
        cmd,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// 입찰 이력 조회
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    MaybeUser(viewer): MaybeUser,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    let bids = handlers::get_bid_history(&state.db, auction_id).await?;
    Ok(Json(bid_history(&bids, viewer.map(|v| v.id))))
}
