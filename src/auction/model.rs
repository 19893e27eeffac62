use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 이미지가 없는 경매에 사용하는 대체 이미지
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

// region:    --- Status
#[derive(Debug, Error)]
#[error("알 수 없는 상태 값: {0}")]
pub struct UnknownStatus(pub String);

/// 경매 진행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Pending,
    Active,
    Paused,
    Ended,
    Rejected,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Draft => "draft",
            AuctionStatus::Pending => "pending",
            AuctionStatus::Active => "active",
            AuctionStatus::Paused => "paused",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AuctionStatus::Draft),
            "pending" => Ok(AuctionStatus::Pending),
            "active" => Ok(AuctionStatus::Active),
            "paused" => Ok(AuctionStatus::Paused),
            "ended" => Ok(AuctionStatus::Ended),
            "rejected" => Ok(AuctionStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for AuctionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 관리자 검수 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ApprovalStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// endregion: --- Status

// region:    --- Auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub name: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub starting_price: i64,
    pub current_bid: i64,
    pub minimum_increment: i64,
    #[sqlx(try_from = "String")]
    pub status: AuctionStatus,
    #[sqlx(try_from = "String")]
    pub approval_status: ApprovalStatus,
    pub image_urls: Vec<String>,
    pub specifications: Option<Json<Vec<Specification>>>,
    pub certificates: Option<Json<Vec<Certificate>>>,
    pub end_time: DateTime<Utc>,
    pub submitted_by: Uuid,
    pub original_submission_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub admin_comparison_comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    pub fn specification_list(&self) -> &[Specification] {
        self.specifications.as_ref().map(|j| j.0.as_slice()).unwrap_or(&[])
    }

    pub fn certificate_list(&self) -> &[Certificate] {
        self.certificates.as_ref().map(|j| j.0.as_slice()).unwrap_or(&[])
    }

    /// 대표 이미지, 없으면 대체 이미지
    pub fn cover_image(&self) -> &str {
        self.image_urls
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn is_resubmission(&self) -> bool {
        self.original_submission_id.is_some()
    }
}

/// 목록 화면용 경매 카드
#[derive(Debug, Clone, Serialize)]
pub struct AuctionCard {
    pub id: Uuid,
    pub title: String,
    pub image: String,
    pub starting_price: i64,
    pub current_bid: i64,
    pub end_time: DateTime<Utc>,
    pub time_left: String,
    pub category: String,
    pub category_name: String,
    pub bids: i64,
    pub status: AuctionStatus,
}

/// 관심 목록/대시보드에 붙는 요약 정보
#[derive(Debug, Clone, Serialize)]
pub struct AuctionSummary {
    pub id: Uuid,
    pub title: String,
    pub image: String,
    pub category: String,
    pub status: AuctionStatus,
    pub approval_status: ApprovalStatus,
    pub current_bid: i64,
    pub starting_price: i64,
}

impl From<&Auction> for AuctionSummary {
    fn from(auction: &Auction) -> Self {
        Self {
            id: auction.id,
            title: auction.title.clone(),
            image: auction.cover_image().to_string(),
            category: auction.category.clone(),
            status: auction.status,
            approval_status: auction.approval_status,
            current_bid: auction.current_bid,
            starting_price: auction.starting_price,
        }
    }
}

/// 승인 상태별 묶음
#[derive(Debug, Default, Serialize)]
pub struct ApprovalGroups {
    pub pending: Vec<Auction>,
    pub approved: Vec<Auction>,
    pub rejected: Vec<Auction>,
}

impl ApprovalGroups {
    pub fn group(auctions: Vec<Auction>) -> Self {
        let mut groups = Self::default();
        for auction in auctions {
            match auction.approval_status {
                ApprovalStatus::Pending => groups.pending.push(auction),
                ApprovalStatus::Approved => groups.approved.push(auction),
                ApprovalStatus::Rejected => groups.rejected.push(auction),
            }
        }
        groups
    }
}

// endregion: --- Auction

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_their_database_values() {
        for status in [
            AuctionStatus::Draft,
            AuctionStatus::Pending,
            AuctionStatus::Active,
            AuctionStatus::Paused,
            AuctionStatus::Ended,
            AuctionStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<AuctionStatus>().unwrap(), status);
        }
        assert!("live".parse::<AuctionStatus>().is_err());
        assert_eq!(
            ApprovalStatus::try_from("approved".to_string()).unwrap(),
            ApprovalStatus::Approved
        );
    }

    #[test]
    fn certificate_date_is_optional_in_json() {
        let cert: Certificate =
            serde_json::from_str(r#"{"name":"GIA Report","issuer":"GIA"}"#).unwrap();
        assert_eq!(cert.date, None);
        let json = serde_json::to_string(&cert).unwrap();
        assert!(!json.contains("date"));
    }
}
