/// 사용자 대시보드
/// 프로필, 출품 현황, 입찰 현황, 관심 경매를 한 번에 돌려준다.
// region:    --- Imports
use crate::auction::model::{ApprovalGroups, Auction};
use crate::bidding::model::{summarize_user_bids, UserBidSummary};
use crate::database::DatabaseManager;
use crate::error::AppResult;
use crate::profiles::Profile;
use crate::query::handlers;
use crate::watchlist::{self, WatchlistEntry};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub profile: Profile,
    pub initials: Option<String>,
    pub submissions: ApprovalGroups,
    pub originals: Vec<Auction>,
    pub bids: Vec<UserBidSummary>,
    pub watchlist: Vec<WatchlistEntry>,
}

/// 입찰 요약에 경매 제목과 상태를 붙인다
pub fn attach_auctions(summaries: &mut [UserBidSummary], auctions: &[Auction]) {
    let by_id: HashMap<Uuid, &Auction> = auctions.iter().map(|a| (a.id, a)).collect();
    for summary in summaries {
        if let Some(auction) = by_id.get(&summary.auction_id) {
            summary.auction_title = Some(auction.title.clone());
            summary.auction_status = Some(auction.status);
        }
    }
}

pub async fn load(db_manager: &DatabaseManager, profile: Profile) -> AppResult<Dashboard> {
    info!("{:<12} --> 대시보드 조회 user: {}", "Dashboard", profile.id);

    let submissions = handlers::get_user_submissions(db_manager, profile.id).await?;
    let originals = handlers::get_originals_for(db_manager, &submissions).await?;

    let user_bids = handlers::get_user_bids(db_manager, profile.id).await?;
    let mut auction_ids: Vec<Uuid> = user_bids.iter().map(|b| b.auction_id).collect();
    auction_ids.sort();
    auction_ids.dedup();
    let leaders = handlers::get_bid_leaders(db_manager, &auction_ids).await?;
    let bid_auctions = handlers::get_auctions_by_ids(db_manager, &auction_ids).await?;
    let mut bids = summarize_user_bids(profile.id, &user_bids, |id| leaders.get(&id).copied());
    attach_auctions(&mut bids, &bid_auctions);

    let watchlist = watchlist::list(db_manager, profile.id).await?;

    Ok(Dashboard {
        initials: profile.initials(),
        profile,
        submissions: ApprovalGroups::group(submissions),
        originals,
        bids,
        watchlist,
    })
}
