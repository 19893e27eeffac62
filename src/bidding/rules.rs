/// 입찰 규칙
/// 1. 입찰 가능 상태 판단
/// 2. 최소 입찰가 계산 및 검증
// region:    --- Imports
use crate::auction::model::{ApprovalStatus, Auction, AuctionStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Rejection
/// 입찰 거절 사유
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("입찰 금액은 최소 {minimum_bid} 이상이어야 합니다.")]
    LowBid { amount: i64, minimum_bid: i64 },
    #[error("관리자가 일시 중지한 경매입니다. 현재 입찰할 수 없습니다.")]
    Paused,
    #[error("승인되지 않은 경매입니다.")]
    NotApproved,
    #[error("진행 중인 경매가 아닙니다.")]
    NotActive,
    #[error("경매가 이미 종료되었습니다.")]
    Ended,
    #[error("관리자는 경매의 공정성을 위해 입찰할 수 없습니다.")]
    AdminBlocked,
    #[error("올바른 입찰 금액을 입력해 주세요.")]
    InvalidAmount,
}

impl BidRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::LowBid { .. } => "LOW_BID",
            BidRejection::Paused => "PAUSED",
            BidRejection::NotApproved => "NOT_APPROVED",
            BidRejection::NotActive => "NOT_ACTIVE",
            BidRejection::Ended => "ALREADY_ENDED",
            BidRejection::AdminBlocked => "ADMIN_CANNOT_BID",
            BidRejection::InvalidAmount => "INVALID_AMOUNT",
        }
    }
}

// endregion: --- Rejection

// region:    --- Bidding State
/// 입찰 가능 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BiddingState {
    Open,
    AdminBlocked,
    NotApproved,
    Paused,
    NotActive,
    Ended,
}

impl BiddingState {
    /// 상태 판단
    /// 관리자 여부 > 승인 여부 > 일시 중지 > 진행 여부 > 종료 시각 순으로 본다.
    pub fn evaluate(
        approval_status: ApprovalStatus,
        status: AuctionStatus,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
        is_admin: bool,
    ) -> Self {
        if is_admin {
            return BiddingState::AdminBlocked;
        }
        if approval_status != ApprovalStatus::Approved {
            return BiddingState::NotApproved;
        }
        match status {
            AuctionStatus::Paused => BiddingState::Paused,
            AuctionStatus::Ended => BiddingState::Ended,
            AuctionStatus::Active if now >= end_time => BiddingState::Ended,
            AuctionStatus::Active => BiddingState::Open,
            _ => BiddingState::NotActive,
        }
    }

    pub fn for_auction(auction: &Auction, now: DateTime<Utc>, is_admin: bool) -> Self {
        Self::evaluate(
            auction.approval_status,
            auction.status,
            auction.end_time,
            now,
            is_admin,
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self, BiddingState::Open)
    }

    /// 입찰 불가 사유
    pub fn rejection(&self) -> Option<BidRejection> {
        match self {
            BiddingState::Open => None,
            BiddingState::AdminBlocked => Some(BidRejection::AdminBlocked),
            BiddingState::NotApproved => Some(BidRejection::NotApproved),
            BiddingState::Paused => Some(BidRejection::Paused),
            BiddingState::NotActive => Some(BidRejection::NotActive),
            BiddingState::Ended => Some(BidRejection::Ended),
        }
    }
}

// endregion: --- Bidding State

// region:    --- Price Rules
/// 현재가
/// 최고 입찰가 > 경매의 현재가 > 시작가 순으로 0이 아닌 첫 값을 쓴다.
pub fn current_price(highest_bid: Option<i64>, current_bid: i64, starting_price: i64) -> i64 {
    highest_bid
        .filter(|bid| *bid > 0)
        .or_else(|| (current_bid > 0).then_some(current_bid))
        .unwrap_or(starting_price)
}

/// 최소 증가액, 설정되지 않았으면 기본값
pub fn effective_increment(increment: i64, default_increment: i64) -> i64 {
    if increment > 0 {
        increment
    } else {
        default_increment
    }
}

pub fn minimum_bid(current: i64, increment: i64) -> i64 {
    current.saturating_add(increment)
}

/// 입찰 금액 검증
pub fn check_bid(amount: i64, minimum: i64) -> Result<(), BidRejection> {
    if amount <= 0 {
        return Err(BidRejection::InvalidAmount);
    }
    if amount < minimum {
        return Err(BidRejection::LowBid {
            amount,
            minimum_bid: minimum,
        });
    }
    Ok(())
}

/// 빠른 입찰 금액: 최소, +증가액, +증가액*2
pub fn quick_bids(minimum: i64, increment: i64) -> [i64; 3] {
    [
        minimum,
        minimum.saturating_add(increment),
        minimum.saturating_add(increment.saturating_mul(2)),
    ]
}

// endregion: --- Price Rules

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn state(approval: ApprovalStatus, status: AuctionStatus, ends_in: i64) -> BiddingState {
        let now = Utc::now();
        BiddingState::evaluate(approval, status, now + Duration::seconds(ends_in), now, false)
    }

    #[test]
    fn approved_active_auction_is_open() {
        assert!(state(ApprovalStatus::Approved, AuctionStatus::Active, 60).is_open());
    }

    #[test]
    fn paused_and_non_active_auctions_disable_bidding() {
        assert_eq!(
            state(ApprovalStatus::Approved, AuctionStatus::Paused, 60),
            BiddingState::Paused
        );
        for status in [
            AuctionStatus::Draft,
            AuctionStatus::Pending,
            AuctionStatus::Rejected,
        ] {
            assert_eq!(
                state(ApprovalStatus::Approved, status, 60),
                BiddingState::NotActive
            );
        }
        assert_eq!(
            state(ApprovalStatus::Approved, AuctionStatus::Ended, 60),
            BiddingState::Ended
        );
    }

    #[test]
    fn unapproved_auction_is_closed_even_if_active() {
        assert_eq!(
            state(ApprovalStatus::Pending, AuctionStatus::Active, 60),
            BiddingState::NotApproved
        );
    }

    #[test]
    fn active_auction_past_end_time_is_ended() {
        assert_eq!(
            state(ApprovalStatus::Approved, AuctionStatus::Active, -1),
            BiddingState::Ended
        );
        assert_eq!(
            state(ApprovalStatus::Approved, AuctionStatus::Active, 0),
            BiddingState::Ended
        );
    }

    #[test]
    fn admins_never_bid() {
        let now = Utc::now();
        let s = BiddingState::evaluate(
            ApprovalStatus::Approved,
            AuctionStatus::Active,
            now + Duration::hours(1),
            now,
            true,
        );
        assert_eq!(s.rejection(), Some(BidRejection::AdminBlocked));
    }

    #[test]
    fn current_price_prefers_highest_bid() {
        assert_eq!(current_price(Some(12_800), 12_500, 8_500), 12_800);
        assert_eq!(current_price(None, 12_500, 8_500), 12_500);
        assert_eq!(current_price(None, 0, 8_500), 8_500);
        assert_eq!(current_price(Some(0), 0, 8_500), 8_500);
    }

    #[test]
    fn bid_below_current_plus_increment_is_rejected() {
        let min = minimum_bid(12_800, 200);
        assert_eq!(min, 13_000);
        assert_eq!(
            check_bid(12_999, min),
            Err(BidRejection::LowBid {
                amount: 12_999,
                minimum_bid: 13_000
            })
        );
        assert!(check_bid(13_000, min).is_ok());
        assert!(check_bid(15_000, min).is_ok());
        assert_eq!(check_bid(0, min), Err(BidRejection::InvalidAmount));
    }

    #[test]
    fn increment_falls_back_to_default() {
        assert_eq!(effective_increment(0, 100), 100);
        assert_eq!(effective_increment(500, 100), 500);
    }

    #[test]
    fn quick_bids_step_by_increment() {
        assert_eq!(quick_bids(13_000, 200), [13_000, 13_200, 13_400]);
    }
}
