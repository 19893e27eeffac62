use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 변경 알림 대상 테이블
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Auctions,
    Bids,
    Categories,
    SavedAuctions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// 변경 이벤트
/// 구독자는 테이블/레코드/사용자 기준으로 걸러 받는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: Uuid,
    // 입찰 갱신으로 영향을 받는 사용자(상회 입찰 당한 사용자 등)
    #[serde(default)]
    pub affected_users: Vec<Uuid>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, record_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            table,
            kind,
            record_id,
            affected_users: Vec::new(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn with_affected_users(mut self, users: Vec<Uuid>) -> Self {
        self.affected_users = users;
        self
    }

    /// 상태 갱신 이벤트용 페이로드
    pub fn auction_status(
        auction_id: Uuid,
        status: &str,
        approval_status: &str,
    ) -> Self {
        Self::new(
            Table::Auctions,
            ChangeKind::Update,
            auction_id,
            serde_json::json!({
                "id": auction_id,
                "status": status,
                "approval_status": approval_status,
            }),
        )
    }
}
