/// 관심 경매
// region:    --- Imports
use crate::auction::events::{ChangeEvent, ChangeKind, Table};
use crate::auction::model::{Auction, AuctionSummary};
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::database::DatabaseManager;
use crate::error::AppResult;
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SavedAuction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub auction_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

/// 관심 목록 한 줄, 경매가 사라졌으면 `auction`은 null
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub auction: Option<AuctionSummary>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SavedState {
    pub auction_id: Uuid,
    pub saved: bool,
}

/// 저장 목록에 경매 요약을 붙인다
pub fn enrich(saved: Vec<SavedAuction>, auctions: &[Auction]) -> Vec<WatchlistEntry> {
    let by_id: HashMap<Uuid, &Auction> = auctions.iter().map(|a| (a.id, a)).collect();
    saved
        .into_iter()
        .map(|s| WatchlistEntry {
            id: s.id,
            auction_id: s.auction_id,
            saved_at: s.saved_at,
            auction: by_id.get(&s.auction_id).map(|a| AuctionSummary::from(*a)),
        })
        .collect()
}

// region:    --- Queries
const GET_SAVED: &str = r#"
    SELECT id, user_id, auction_id, saved_at FROM saved_auctions
    WHERE user_id = $1
    ORDER BY saved_at DESC
"#;

const IS_SAVED: &str =
    "SELECT EXISTS (SELECT 1 FROM saved_auctions WHERE user_id = $1 AND auction_id = $2)";

const INSERT_SAVED: &str = r#"
    INSERT INTO saved_auctions (user_id, auction_id) VALUES ($1, $2)
    ON CONFLICT (user_id, auction_id) DO NOTHING
    RETURNING id, user_id, auction_id, saved_at
"#;

const DELETE_SAVED: &str = r#"
    DELETE FROM saved_auctions WHERE user_id = $1 AND auction_id = $2
    RETURNING id, user_id, auction_id, saved_at
"#;

/// 관심 목록 조회
pub async fn list(db_manager: &DatabaseManager, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
    let saved = sqlx::query_as::<_, SavedAuction>(GET_SAVED)
        .bind(user_id)
        .fetch_all(db_manager.pool())
        .await?;
    let ids: Vec<Uuid> = saved.iter().map(|s| s.auction_id).collect();
    let auctions = handlers::get_auctions_by_ids(db_manager, &ids).await?;
    Ok(enrich(saved, &auctions))
}

pub async fn is_saved(db_manager: &DatabaseManager, user_id: Uuid, auction_id: Uuid) -> AppResult<bool> {
    let saved: bool = sqlx::query_scalar(IS_SAVED)
        .bind(user_id)
        .bind(auction_id)
        .fetch_one(db_manager.pool())
        .await?;
    Ok(saved)
}

/// 관심 경매 추가, 이미 있으면 그대로 둔다
pub async fn save(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    user_id: Uuid,
    auction_id: Uuid,
) -> AppResult<SavedState> {
    handlers::get_auction(db_manager, auction_id).await?;
    info!("{:<12} --> 관심 경매 추가 user: {}, auction: {}", "Watchlist", user_id, auction_id);
    let inserted = sqlx::query_as::<_, SavedAuction>(INSERT_SAVED)
        .bind(user_id)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    if let Some(saved) = inserted {
        publish_saved(publisher, ChangeKind::Insert, &saved).await;
    }
    Ok(SavedState {
        auction_id,
        saved: true,
    })
}

/// 관심 경매 삭제, 없어도 성공
pub async fn remove(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    user_id: Uuid,
    auction_id: Uuid,
) -> AppResult<SavedState> {
    info!("{:<12} --> 관심 경매 삭제 user: {}, auction: {}", "Watchlist", user_id, auction_id);
    let deleted = sqlx::query_as::<_, SavedAuction>(DELETE_SAVED)
        .bind(user_id)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    if let Some(saved) = deleted {
        publish_saved(publisher, ChangeKind::Delete, &saved).await;
    }
    Ok(SavedState {
        auction_id,
        saved: false,
    })
}

/// 관심 경매 토글
pub async fn toggle(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    user_id: Uuid,
    auction_id: Uuid,
) -> AppResult<SavedState> {
    if is_saved(db_manager, user_id, auction_id).await? {
        remove(db_manager, publisher, user_id, auction_id).await
    } else {
        save(db_manager, publisher, user_id, auction_id).await
    }
}

async fn publish_saved(publisher: &dyn ChangePublisher, kind: ChangeKind, saved: &SavedAuction) {
    let payload = serde_json::json!({
        "id": saved.id,
        "user_id": saved.user_id,
        "auction_id": saved.auction_id,
    });
    publish_or_warn(
        publisher,
        ChangeEvent::new(Table::SavedAuctions, kind, saved.id, payload)
            .with_affected_users(vec![saved.user_id]),
    )
    .await;
}

// endregion: --- Queries

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_auctions_become_null_entries() {
        let user = Uuid::new_v4();
        let saved = vec![SavedAuction {
            id: Uuid::new_v4(),
            user_id: user,
            auction_id: Uuid::new_v4(),
            saved_at: Utc::now(),
        }];
        let entries = enrich(saved, &[]);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].auction.is_none());
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert!(json["auction"].is_null());
    }
}
