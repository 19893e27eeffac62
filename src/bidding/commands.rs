/// 입찰 관련 커맨드 처리
/// 1. 입찰 가능 상태 검증
/// 2. 최소 입찰가 검증
/// 3. 조건부 현재가 갱신 + 이전 입찰 무효화 + 입찰 추가 (한 트랜잭션)
/// 4. 변경 이벤트 발행
// region:    --- Imports
use crate::auction::events::{ChangeEvent, ChangeKind, Table};
use crate::bidding::model::Bid;
use crate::bidding::rules::{self, BidRejection, BiddingState};
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::config::BiddingConfig;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::profiles::Profile;
use crate::query::{handlers, queries};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub bid_amount: i64,
}

/// 입찰 결과
#[derive(Debug, Serialize)]
pub struct BidOutcome {
    pub bid: Bid,
    pub current_bid: i64,
    pub minimum_next_bid: i64,
    pub quick_bids: [i64; 3],
}

/// 입찰 처리
/// 동시 입찰은 데이터베이스의 조건부 갱신이 정리한다.
/// 먼저 반영된 더 높은 입찰이 있으면 재시도하지 않고 새 최소 입찰가와 함께 거절한다.
pub async fn handle_place_bid(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    config: &BiddingConfig,
    bidder: &Profile,
    auction_id: Uuid,
    cmd: PlaceBidCommand,
) -> AppResult<BidOutcome> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작 auction: {}, bidder: {}, amount: {}",
        "Command", auction_id, bidder.id, cmd.bid_amount
    );

    let auction = handlers::get_auction(db_manager, auction_id).await?;
    let now = Utc::now();

    // 경매 상태 검증
    if let Some(rejection) = BiddingState::for_auction(&auction, now, bidder.is_admin()).rejection() {
        return Err(rejection.into());
    }

    // 최소 입찰가 검증
    let highest = handlers::get_highest_bid(db_manager, auction_id).await?;
    let current = rules::current_price(
        highest.map(|(amount, _)| amount),
        auction.current_bid,
        auction.starting_price,
    );
    let increment = rules::effective_increment(
        auction.minimum_increment,
        config.default_minimum_increment,
    );
    rules::check_bid(cmd.bid_amount, rules::minimum_bid(current, increment))?;

    let bid_id = Uuid::new_v4();
    let bidder_id = bidder.id;
    let amount = cmd.bid_amount;

    let applied = db_manager
        .transaction::<_, Option<(Bid, Vec<Uuid>)>, AppError>(|tx| {
            Box::pin(async move {
                // 조건부 현재가 갱신
                let raised = sqlx::query(queries::RAISE_CURRENT_BID)
                    .bind(auction_id)
                    .bind(amount)
                    .bind(increment)
                    .fetch_optional(&mut **tx)
                    .await?;
                if raised.is_none() {
                    return Ok(None);
                }

                // 이전 최고 입찰 무효화
                let superseded = sqlx::query(queries::SUPERSEDE_ACTIVE_BIDS)
                    .bind(auction_id)
                    .fetch_all(&mut **tx)
                    .await?;
                let mut outbid: Vec<Uuid> = superseded
                    .iter()
                    .map(|row| row.get::<Uuid, _>("user_id"))
                    .filter(|user| *user != bidder_id)
                    .collect();
                outbid.sort();
                outbid.dedup();

                // 입찰 추가
                let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                    .bind(bid_id)
                    .bind(auction_id)
                    .bind(bidder_id)
                    .bind(amount)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await?;

                Ok(Some((bid, outbid)))
            })
        })
        .await?;

    let Some((bid, outbid)) = applied else {
        return Err(stale_bid_rejection(db_manager, config, bidder, auction_id, amount).await);
    };

    info!(
        "{:<12} --> 입찰 반영 완료 auction: {}, amount: {}, 상회된 입찰자 수: {}",
        "Command",
        auction_id,
        amount,
        outbid.len()
    );

    publish_bid_events(publisher, &bid, &auction, outbid).await;

    let minimum_next_bid = rules::minimum_bid(amount, increment);
    Ok(BidOutcome {
        bid,
        current_bid: amount,
        minimum_next_bid,
        quick_bids: rules::quick_bids(minimum_next_bid, increment),
    })
}

/// 조건부 갱신에 실패한 입찰의 거절 사유
/// 경매를 다시 읽어 상태가 바뀌었으면 그 사유를, 아니면 새 최소 입찰가를 돌려준다.
async fn stale_bid_rejection(
    db_manager: &DatabaseManager,
    config: &BiddingConfig,
    bidder: &Profile,
    auction_id: Uuid,
    amount: i64,
) -> AppError {
    warn!(
        "{:<12} --> 동시 입찰로 인한 갱신 실패 auction: {}, amount: {}",
        "Command", auction_id, amount
    );
    let fresh = match handlers::get_auction(db_manager, auction_id).await {
        Ok(auction) => auction,
        Err(e) => return e,
    };
    if let Some(rejection) =
        BiddingState::for_auction(&fresh, Utc::now(), bidder.is_admin()).rejection()
    {
        return rejection.into();
    }
    let increment = rules::effective_increment(
        fresh.minimum_increment,
        config.default_minimum_increment,
    );
    let current = rules::current_price(None, fresh.current_bid, fresh.starting_price);
    BidRejection::LowBid {
        amount,
        minimum_bid: rules::minimum_bid(current, increment),
    }
    .into()
}

/// 입찰 추가 이벤트(상회된 사용자 포함)와 경매 현재가 갱신 이벤트 발행
async fn publish_bid_events(
    publisher: &dyn ChangePublisher,
    bid: &Bid,
    auction: &crate::auction::model::Auction,
    outbid: Vec<Uuid>,
) {
    let bid_payload = serde_json::json!({
        "id": bid.id,
        "auction_id": bid.auction_id,
        "user_id": bid.user_id,
        "bid_amount": bid.bid_amount,
        "bid_time": bid.bid_time,
        "status": bid.status.as_str(),
        "auction_title": auction.title,
    });
    publish_or_warn(
        publisher,
        ChangeEvent::new(Table::Bids, ChangeKind::Insert, bid.id, bid_payload)
            .with_affected_users(outbid),
    )
    .await;

    let auction_payload = serde_json::json!({
        "id": auction.id,
        "current_bid": bid.bid_amount,
        "status": auction.status.as_str(),
        "approval_status": auction.approval_status.as_str(),
    });
    publish_or_warn(
        publisher,
        ChangeEvent::new(Table::Auctions, ChangeKind::Update, auction.id, auction_payload),
    )
    .await;
}

// endregion: --- Commands
