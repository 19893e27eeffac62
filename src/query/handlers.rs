// region:    --- Imports
use super::queries;
use crate::auction::model::Auction;
use crate::bidding::model::Bid;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use sqlx::Row;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

/// 입찰 수가 붙은 경매
#[derive(Debug, sqlx::FromRow)]
pub struct AuctionWithBidCount {
    #[sqlx(flatten)]
    pub auction: Auction,
    pub bid_count: i64,
}

// region:    --- Query Handlers

/// 경매 조회
pub async fn find_auction(db_manager: &DatabaseManager, auction_id: Uuid) -> AppResult<Option<Auction>> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(auction)
}

/// 경매 조회, 없으면 NotFound
pub async fn get_auction(db_manager: &DatabaseManager, auction_id: Uuid) -> AppResult<Auction> {
    find_auction(db_manager, auction_id)
        .await?
        .ok_or_else(|| AppError::not_found("경매"))
}

/// 공개 경매 목록 조회
pub async fn get_public_auctions(
    db_manager: &DatabaseManager,
    category: Option<&str>,
) -> AppResult<Vec<AuctionWithBidCount>> {
    info!("{:<12} --> 공개 경매 목록 조회 category: {:?}", "Query", category);
    let auctions = sqlx::query_as::<_, AuctionWithBidCount>(queries::GET_PUBLIC_AUCTIONS)
        .bind(category)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(auctions)
}

/// 최고 입찰 조회 (금액, 입찰자)
pub async fn get_highest_bid(
    db_manager: &DatabaseManager,
    auction_id: Uuid,
) -> AppResult<Option<(i64, Uuid)>> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
    let row = sqlx::query(queries::GET_HIGHEST_BID)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(row.map(|r| (r.get("bid_amount"), r.get("user_id"))))
}

/// 입찰 이력 조회
pub async fn get_bid_history(db_manager: &DatabaseManager, auction_id: Uuid) -> AppResult<Vec<Bid>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    let bids = sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
        .bind(auction_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bids)
}

/// 사용자 입찰 조회
pub async fn get_user_bids(db_manager: &DatabaseManager, user_id: Uuid) -> AppResult<Vec<Bid>> {
    info!("{:<12} --> 사용자 입찰 조회 user: {}", "Query", user_id);
    let bids = sqlx::query_as::<_, Bid>(queries::GET_USER_BIDS)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(bids)
}

/// 사용자 출품 조회
pub async fn get_user_submissions(
    db_manager: &DatabaseManager,
    user_id: Uuid,
) -> AppResult<Vec<Auction>> {
    info!("{:<12} --> 사용자 출품 조회 user: {}", "Query", user_id);
    let auctions = sqlx::query_as::<_, Auction>(queries::GET_USER_SUBMISSIONS)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(auctions)
}

/// 전체 경매 조회
pub async fn get_all_auctions(db_manager: &DatabaseManager) -> AppResult<Vec<Auction>> {
    info!("{:<12} --> 전체 경매 조회", "Query");
    let auctions = sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(auctions)
}

/// id 목록으로 경매 조회
pub async fn get_auctions_by_ids(
    db_manager: &DatabaseManager,
    ids: &[Uuid],
) -> AppResult<Vec<Auction>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let auctions = sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_BY_IDS)
        .bind(ids)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(auctions)
}

/// 재출품의 원본 경매 조회
pub async fn get_originals_for(
    db_manager: &DatabaseManager,
    auctions: &[Auction],
) -> AppResult<Vec<Auction>> {
    let mut ids: Vec<Uuid> = auctions
        .iter()
        .filter_map(|a| a.original_submission_id)
        .collect();
    ids.sort();
    ids.dedup();
    get_auctions_by_ids(db_manager, &ids).await
}

/// 경매별 최고 입찰 조회 (경매 id -> (금액, 입찰자))
pub async fn get_bid_leaders(
    db_manager: &DatabaseManager,
    auction_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, (i64, Uuid)>> {
    if auction_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query(queries::GET_BID_LEADERS)
        .bind(auction_ids)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let leader: (i64, Uuid) = (r.get("bid_amount"), r.get("user_id"));
            (r.get::<Uuid, _>("auction_id"), leader)
        })
        .collect())
}

// endregion: --- Query Handlers
