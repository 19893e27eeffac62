use crate::auction::model::{AuctionStatus, UnknownStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// 입찰 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    Active,
    Superseded,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Active => "active",
            BidStatus::Superseded => "superseded",
        }
    }
}

impl FromStr for BidStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BidStatus::Active),
            "superseded" => Ok(BidStatus::Superseded),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for BidStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub user_id: Uuid,
    pub bid_amount: i64,
    pub bid_time: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: BidStatus,
}

/// 입찰 이력 한 줄
#[derive(Debug, Clone, Serialize)]
pub struct BidView {
    pub id: Uuid,
    pub bidder: String,
    pub amount: i64,
    pub time: DateTime<Utc>,
    pub is_highest: bool,
}

/// 입찰자 표시 이름: 본인이면 "You", 아니면 id 앞 6자리
pub fn bidder_label(bidder: Uuid, viewer: Option<Uuid>) -> String {
    if viewer == Some(bidder) {
        return "You".to_string();
    }
    let simple = bidder.simple().to_string();
    format!("Bidder #{}", &simple[..6])
}

/// 금액 내림차순으로 정렬된 입찰 목록을 이력 화면으로 변환
pub fn bid_history(bids: &[Bid], viewer: Option<Uuid>) -> Vec<BidView> {
    bids.iter()
        .enumerate()
        .map(|(index, bid)| BidView {
            id: bid.id,
            bidder: bidder_label(bid.user_id, viewer),
            amount: bid.bid_amount,
            time: bid.bid_time,
            is_highest: index == 0,
        })
        .collect()
}

/// 대시보드: 경매별 내 입찰 요약
#[derive(Debug, Clone, Serialize)]
pub struct UserBidSummary {
    pub auction_id: Uuid,
    pub auction_title: Option<String>,
    pub auction_status: Option<AuctionStatus>,
    pub latest_bid_time: DateTime<Utc>,
    pub user_highest_bid: i64,
    pub current_highest_bid: i64,
    pub is_winning: bool,
    pub total_bids: usize,
}

/// 사용자의 입찰(최신순)을 경매 단위로 묶는다
/// `leader`는 경매별 (최고 입찰가, 입찰자)이며, 경매가 사라졌으면 None이다.
pub fn summarize_user_bids<F>(user_id: Uuid, bids: &[Bid], mut leader: F) -> Vec<UserBidSummary>
where
    F: FnMut(Uuid) -> Option<(i64, Uuid)>,
{
    let mut order: Vec<Uuid> = Vec::new();
    for bid in bids {
        if !order.contains(&bid.auction_id) {
            order.push(bid.auction_id);
        }
    }

    order
        .into_iter()
        .filter_map(|auction_id| {
            let mine: Vec<&Bid> = bids.iter().filter(|b| b.auction_id == auction_id).collect();
            let latest = mine.first()?;
            let user_highest_bid = mine.iter().map(|b| b.bid_amount).max()?;
            let top = leader(auction_id);
            Some(UserBidSummary {
                auction_id,
                auction_title: None,
                auction_status: None,
                latest_bid_time: latest.bid_time,
                user_highest_bid,
                current_highest_bid: top.map(|(amount, _)| amount).unwrap_or(user_highest_bid),
                is_winning: top.map(|(_, who)| who == user_id).unwrap_or(false),
                total_bids: mine.len(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bid(auction_id: Uuid, user_id: Uuid, amount: i64, minutes_ago: i64) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            auction_id,
            user_id,
            bid_amount: amount,
            bid_time: Utc::now() - Duration::minutes(minutes_ago),
            status: BidStatus::Active,
        }
    }

    #[test]
    fn bidder_label_hides_other_users() {
        let me = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        let other = Uuid::parse_str("0f1e2d3c-0000-0000-0000-000000000000").unwrap();
        assert_eq!(bidder_label(me, Some(me)), "You");
        assert_eq!(bidder_label(other, Some(me)), "Bidder #0f1e2d");
        assert_eq!(bidder_label(other, None), "Bidder #0f1e2d");
    }

    #[test]
    fn history_marks_first_row_as_highest() {
        let auction = Uuid::new_v4();
        let bids = vec![
            bid(auction, Uuid::new_v4(), 12_800, 15),
            bid(auction, Uuid::new_v4(), 12_500, 45),
        ];
        let history = bid_history(&bids, None);
        assert!(history[0].is_highest);
        assert!(!history[1].is_highest);
    }

    #[test]
    fn user_bids_are_grouped_per_auction() {
        let me = Uuid::new_v4();
        let rival = Uuid::new_v4();
        let ring = Uuid::new_v4();
        let watch = Uuid::new_v4();
        let bids = vec![
            bid(ring, me, 12_200, 5),
            bid(watch, me, 4_800, 10),
            bid(ring, me, 11_800, 60),
        ];
        let summary = summarize_user_bids(me, &bids, |auction| {
            if auction == ring {
                Some((12_200, me))
            } else {
                Some((4_950, rival))
            }
        });
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].auction_id, ring);
        assert_eq!(summary[0].user_highest_bid, 12_200);
        assert_eq!(summary[0].total_bids, 2);
        assert!(summary[0].is_winning);
        assert_eq!(summary[1].current_highest_bid, 4_950);
        assert!(!summary[1].is_winning);
    }

    #[test]
    fn orphaned_auction_falls_back_to_own_bid() {
        let me = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let summary = summarize_user_bids(me, &[bid(gone, me, 900, 1)], |_| None);
        assert_eq!(summary[0].current_highest_bid, 900);
        assert!(!summary[0].is_winning);
    }
}
