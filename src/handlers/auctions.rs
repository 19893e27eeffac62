// region:    --- Imports
use super::extract::{Json, Path, Query};
use crate::auction::countdown::{format_time_left, TimeLeft};
use crate::auction::model::{ApprovalStatus, Auction, AuctionCard};
use crate::auth::MaybeUser;
use crate::bidding::rules::{self, BiddingState};
use crate::catalog::{self, CategoryDirectory};
use crate::error::{AppError, AppResult};
use crate::query::handlers::{self, AuctionWithBidCount};
use crate::state::AppState;
use crate::watchlist;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

// endregion: --- Imports

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// 경매 상세 응답
#[derive(Debug, Serialize)]
pub struct AuctionDetail {
    #[serde(flatten)]
    pub auction: Auction,
    pub category_name: String,
    pub time_left: String,
    pub seconds_left: i64,
    pub current_price: i64,
    pub minimum_bid: i64,
    pub quick_bids: [i64; 3],
    pub bidding_state: BiddingState,
    pub bid_count: usize,
    pub is_highest_bidder: bool,
    pub is_saved: Option<bool>,
}

/// 목록 카드 생성
pub fn auction_card(
    row: AuctionWithBidCount,
    directory: &CategoryDirectory,
    now: DateTime<Utc>,
) -> AuctionCard {
    let auction = row.auction;
    AuctionCard {
        id: auction.id,
        image: auction.cover_image().to_string(),
        starting_price: auction.starting_price,
        current_bid: rules::current_price(None, auction.current_bid, auction.starting_price),
        end_time: auction.end_time,
        time_left: format_time_left(auction.end_time, now),
        category_name: directory.name_for(&auction.category).to_string(),
        bids: row.bid_count,
        status: auction.status,
        title: auction.title,
        category: auction.category,
    }
}

/// 카테고리를 읽지 못해도 목록은 보여 준다
async fn category_directory(state: &AppState) -> CategoryDirectory {
    match catalog::directory(&state.db).await {
        Ok(directory) => directory,
        Err(e) => {
            warn!("{:<12} --> 카테고리 조회 실패, 기본 목록 사용: {}", "HandlerQuery", e);
            CategoryDirectory::defaults()
        }
    }
}

// region:    --- Query Handlers

/// 상태 확인
pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 활성 카테고리 조회
pub async fn handle_list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 카테고리 조회", "HandlerQuery");
    Ok(Json(catalog::list_active(&state.db).await?))
}

/// 공개 경매 목록 조회
pub async fn handle_list_auctions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 경매 목록 조회 category: {:?}", "HandlerQuery", query.category);
    let category = query.category.as_deref().filter(|c| !c.is_empty() && *c != "all");
    let rows = handlers::get_public_auctions(&state.db, category).await?;
    let directory = category_directory(&state).await;
    let now = Utc::now();
    let cards: Vec<AuctionCard> = rows
        .into_iter()
        .map(|row| auction_card(row, &directory, now))
        .collect();
    Ok(Json(cards))
}

/// 경매 상세 조회
/// 승인되지 않은 경매는 출품자와 관리자만 볼 수 있다.
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<Uuid>,
    MaybeUser(viewer): MaybeUser,
) -> AppResult<impl IntoResponse> {
    info!("{:<12} --> 경매 상세 조회 id: {}", "HandlerQuery", auction_id);
    let auction = handlers::get_auction(&state.db, auction_id).await?;

    let is_admin = viewer.as_ref().map(|v| v.is_admin()).unwrap_or(false);
    let is_owner = viewer.as_ref().map(|v| v.id == auction.submitted_by).unwrap_or(false);
    if auction.approval_status != ApprovalStatus::Approved && !is_admin && !is_owner {
        return Err(AppError::not_found("경매"));
    }

    let now = Utc::now();
    let bids = handlers::get_bid_history(&state.db, auction_id).await?;
    let highest = handlers::get_highest_bid(&state.db, auction_id).await?;
    let current = rules::current_price(
        highest.map(|(amount, _)| amount),
        auction.current_bid,
        auction.starting_price,
    );
    let increment = rules::effective_increment(
        auction.minimum_increment,
        state.config.bidding.default_minimum_increment,
    );
    let minimum_bid = rules::minimum_bid(current, increment);
    let is_saved = match &viewer {
        Some(v) => Some(watchlist::is_saved(&state.db, v.id, auction_id).await?),
        None => None,
    };
    let directory = category_directory(&state).await;

    Ok(Json(AuctionDetail {
        category_name: directory.name_for(&auction.category).to_string(),
        time_left: format_time_left(auction.end_time, now),
        seconds_left: TimeLeft::until(auction.end_time, now)
            .map(|left| left.total_seconds())
            .unwrap_or(0),
        current_price: current,
        minimum_bid,
        quick_bids: rules::quick_bids(minimum_bid, increment),
        bidding_state: BiddingState::for_auction(&auction, now, is_admin),
        bid_count: bids.len(),
        is_highest_bidder: match (&viewer, highest) {
            (Some(v), Some((_, bidder))) => v.id == bidder,
            _ => false,
        },
        is_saved,
        auction,
    }))
}

// endregion: --- Query Handlers
