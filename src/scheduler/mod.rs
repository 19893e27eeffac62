/// 경매 마감 스케줄러
/// 1초마다 종료 시각이 지난 진행/일시 중지 경매를 마감하고 변경 이벤트를 보낸다.
// region:    --- Imports
use crate::auction::events::ChangeEvent;
use crate::auction::model::AuctionStatus;
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::query::queries;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Auction Scheduler
pub struct AuctionScheduler {
    pool: Arc<PgPool>,
    publisher: Arc<dyn ChangePublisher>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { pool, publisher }
    }

    /// 스케줄러 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                match Self::close_expired_auctions(&pool, Utc::now()).await {
                    Ok(closed) => {
                        for (auction_id, approval_status) in closed {
                            publish_or_warn(
                                publisher.as_ref(),
                                ChangeEvent::auction_status(
                                    auction_id,
                                    AuctionStatus::Ended.as_str(),
                                    &approval_status,
                                ),
                            )
                            .await;
                        }
                    }
                    Err(e) => error!(
                        "{:<12} --> 경매 마감 처리 중 오류 발생: {:?}",
                        "Scheduler", e
                    ),
                }
            }
        });
    }

    /// 종료 시각이 지난 경매 마감
    /// 마감된 (경매 id, 승인 상태) 목록을 돌려준다.
    pub async fn close_expired_auctions(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
        let rows = sqlx::query(queries::CLOSE_EXPIRED_AUCTIONS)
            .bind(now)
            .fetch_all(pool)
            .await?;

        let closed: Vec<(Uuid, String)> = rows
            .iter()
            .map(|row| (row.get::<Uuid, _>("id"), row.get::<String, _>("approval_status")))
            .collect();
        if !closed.is_empty() {
            info!("{:<12} --> 경매 {}건 마감", "Scheduler", closed.len());
        }
        Ok(closed)
    }
}
// endregion: --- Auction Scheduler
