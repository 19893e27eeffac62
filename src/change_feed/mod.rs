/// 변경 알림
/// 1. 발행: Kafka 또는 프로세스 내부 허브
/// 2. 소비: Kafka 토픽 -> 허브 -> SSE 구독자
// region:    --- Imports
use crate::auction::events::{ChangeEvent, Table};
use crate::bidding::model::bidder_label;
use crate::message_broker::{HandlerFuture, KafkaConsumer};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// endregion: --- Imports

const HUB_CAPACITY: usize = 1024;

// region:    --- Publisher
/// 변경 이벤트 발행 트레이트
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> Result<(), String>;
}

/// 발행 실패는 기록만 한다. 데이터베이스 반영은 이미 끝난 상태이다.
pub async fn publish_or_warn(publisher: &dyn ChangePublisher, event: ChangeEvent) {
    let record_id = event.record_id;
    if let Err(e) = publisher.publish(event).await {
        warn!(
            "{:<12} --> 변경 이벤트 발행 실패 id: {}, 오류: {}",
            "ChangeFeed", record_id, e
        );
    }
}

/// Kafka 없이 허브로 바로 전달하는 발행자
pub struct HubPublisher {
    hub: ChangeHub,
}

impl HubPublisher {
    pub fn new(hub: ChangeHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChangePublisher for HubPublisher {
    async fn publish(&self, event: ChangeEvent) -> Result<(), String> {
        self.hub.broadcast(event);
        Ok(())
    }
}

// endregion: --- Publisher

// region:    --- Hub
/// 프로세스 내부 구독 허브
#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// 구독자가 없으면 버린다
    pub fn broadcast(&self, event: ChangeEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!("{:<12} --> 이벤트 전달, 구독자 수: {}", "ChangeHub", receivers);
    }
}

// endregion: --- Hub

// region:    --- Filter
/// 구독 조건
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeFilter {
    pub table: Option<Table>,
    pub id: Option<Uuid>,
    pub user: Option<Uuid>,
}

impl ChangeFilter {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if let Some(table) = self.table {
            if table != event.table {
                return false;
            }
        }
        if let Some(id) = self.id {
            // 입찰 이벤트는 경매 id로도 구독할 수 있다
            let auction_id = event
                .payload
                .get("auction_id")
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok());
            if event.record_id != id && auction_id != Some(id) {
                return false;
            }
        }
        if let Some(user) = self.user {
            if !event.affected_users.contains(&user) {
                return false;
            }
        }
        true
    }
}

// endregion: --- Filter

// region:    --- Visibility
/// 구독자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: Uuid,
    pub is_admin: bool,
}

fn payload_uuid(event: &ChangeEvent, key: &str) -> Option<Uuid> {
    event
        .payload
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
}

/// 구독자에게 보낼 이벤트
/// 관리자는 원본을 받는다. 그 외에는
/// - 승인되지 않은 경매 이벤트는 출품자에게만
/// - 관심 경매 이벤트는 본인에게만
/// - 입찰자 id는 이력 화면과 같은 라벨로 바꾼다
/// - 영향 받은 사용자 목록에는 구독자 본인만 남긴다
pub fn visible_to(mut event: ChangeEvent, viewer: Option<Viewer>) -> Option<ChangeEvent> {
    if viewer.map(|v| v.is_admin).unwrap_or(false) {
        return Some(event);
    }
    let viewer_id = viewer.map(|v| v.id);
    let involved = viewer_id
        .map(|id| {
            event.affected_users.contains(&id)
                || payload_uuid(&event, "submitted_by") == Some(id)
                || payload_uuid(&event, "user_id") == Some(id)
        })
        .unwrap_or(false);

    match event.table {
        Table::Auctions => {
            let approved =
                event.payload.get("approval_status").and_then(|v| v.as_str()) == Some("approved");
            if !approved && !involved {
                return None;
            }
        }
        Table::SavedAuctions if !involved => return None,
        Table::Bids => {
            if let Some(bidder) = payload_uuid(&event, "user_id") {
                if let Some(fields) = event.payload.as_object_mut() {
                    fields.remove("user_id");
                    fields.insert(
                        "bidder".to_string(),
                        serde_json::Value::String(bidder_label(bidder, viewer_id)),
                    );
                }
            }
        }
        Table::SavedAuctions | Table::Categories => {}
    }

    event.affected_users.retain(|user| Some(*user) == viewer_id);
    Some(event)
}

// endregion: --- Visibility

// region:    --- Change Consumer
/// Kafka 변경 이벤트를 허브로 옮기는 소비자
pub struct ChangeConsumer {
    hub: ChangeHub,
    kafka_consumer: Arc<KafkaConsumer>,
    topic: String,
}

impl ChangeConsumer {
    pub fn new(hub: ChangeHub, kafka_consumer: Arc<KafkaConsumer>, topic: &str) -> Self {
        ChangeConsumer {
            hub,
            kafka_consumer,
            topic: topic.to_string(),
        }
    }

    /// 소비 시작
    pub async fn start(&self) {
        info!("{:<12} --> 변경 이벤트 소비 시작", "ChangeFeed");
        let hub = self.hub.clone();
        if let Err(e) = self
            .kafka_consumer
            .consume_events(&self.topic, move |event| {
                let hub = hub.clone();
                let fut: HandlerFuture = Box::pin(async move {
                    hub.broadcast(event);
                    Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                });
                fut
            })
            .await
        {
            error!("{:<12} --> 이벤트 소비 오류: {:?}", "ChangeFeed", e);
        }
    }
}

// endregion: --- Change Consumer

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::ChangeKind;

    fn bid_event(auction_id: Uuid, outbid: Uuid) -> ChangeEvent {
        ChangeEvent::new(
            Table::Bids,
            ChangeKind::Insert,
            Uuid::new_v4(),
            serde_json::json!({ "auction_id": auction_id.to_string(), "bid_amount": 1300 }),
        )
        .with_affected_users(vec![outbid])
    }

    #[test]
    fn empty_filter_matches_everything() {
        let event = bid_event(Uuid::new_v4(), Uuid::new_v4());
        assert!(ChangeFilter::default().matches(&event));
    }

    #[test]
    fn table_and_auction_id_filters() {
        let auction = Uuid::new_v4();
        let event = bid_event(auction, Uuid::new_v4());
        let by_auction = ChangeFilter {
            table: Some(Table::Bids),
            id: Some(auction),
            user: None,
        };
        assert!(by_auction.matches(&event));

        let wrong_table = ChangeFilter {
            table: Some(Table::Auctions),
            ..Default::default()
        };
        assert!(!wrong_table.matches(&event));

        let other_auction = ChangeFilter {
            id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(!other_auction.matches(&event));
    }

    #[test]
    fn user_filter_selects_outbid_notifications() {
        let outbid = Uuid::new_v4();
        let event = bid_event(Uuid::new_v4(), outbid);
        assert!(ChangeFilter {
            user: Some(outbid),
            ..Default::default()
        }
        .matches(&event));
        assert!(!ChangeFilter {
            user: Some(Uuid::new_v4()),
            ..Default::default()
        }
        .matches(&event));
    }

    #[tokio::test]
    async fn hub_publisher_reaches_subscribers() {
        let hub = ChangeHub::new();
        let mut rx = hub.subscribe();
        let publisher = HubPublisher::new(hub.clone());
        let auction = Uuid::new_v4();
        publisher
            .publish(ChangeEvent::auction_status(auction, "paused", "approved"))
            .await
            .unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.record_id, auction);
        assert_eq!(received.payload["status"], "paused");
    }

    #[tokio::test]
    async fn broadcasting_without_subscribers_is_fine() {
        let hub = ChangeHub::new();
        hub.broadcast(ChangeEvent::auction_status(Uuid::new_v4(), "ended", "approved"));
    }

    fn bid_by(bidder: Uuid, outbid: Uuid) -> ChangeEvent {
        ChangeEvent::new(
            Table::Bids,
            ChangeKind::Insert,
            Uuid::new_v4(),
            serde_json::json!({
                "auction_id": Uuid::new_v4().to_string(),
                "user_id": bidder.to_string(),
                "bid_amount": 1300,
            }),
        )
        .with_affected_users(vec![outbid])
    }

    #[test]
    fn anonymous_viewers_see_bid_labels_not_ids() {
        let bidder = Uuid::new_v4();
        let outbid = Uuid::new_v4();
        let event = visible_to(bid_by(bidder, outbid), None).unwrap();
        assert!(event.payload.get("user_id").is_none());
        assert!(event.payload["bidder"].as_str().unwrap().starts_with("Bidder #"));
        assert!(event.affected_users.is_empty());
        assert!(!serde_json::to_string(&event).unwrap().contains(&bidder.to_string()));
    }

    #[test]
    fn bidders_see_themselves_and_their_outbid_notice() {
        let bidder = Uuid::new_v4();
        let outbid = Uuid::new_v4();
        let own = visible_to(
            bid_by(bidder, outbid),
            Some(Viewer { id: bidder, is_admin: false }),
        )
        .unwrap();
        assert_eq!(own.payload["bidder"], "You");

        let notice = visible_to(
            bid_by(bidder, outbid),
            Some(Viewer { id: outbid, is_admin: false }),
        )
        .unwrap();
        assert_eq!(notice.affected_users, vec![outbid]);
    }

    #[test]
    fn pending_listings_reach_only_submitter_and_admins() {
        let submitter = Uuid::new_v4();
        let pending = || {
            ChangeEvent::new(
                Table::Auctions,
                ChangeKind::Insert,
                Uuid::new_v4(),
                serde_json::json!({
                    "title": "Patek Calatrava",
                    "approval_status": "pending",
                    "submitted_by": submitter.to_string(),
                }),
            )
            .with_affected_users(vec![submitter])
        };
        assert!(visible_to(pending(), None).is_none());
        assert!(visible_to(pending(), Some(Viewer { id: Uuid::new_v4(), is_admin: false })).is_none());
        assert!(visible_to(pending(), Some(Viewer { id: submitter, is_admin: false })).is_some());
        let for_admin = visible_to(pending(), Some(Viewer { id: Uuid::new_v4(), is_admin: true })).unwrap();
        assert_eq!(for_admin.affected_users, vec![submitter]);

        let approved = ChangeEvent::auction_status(Uuid::new_v4(), "active", "approved");
        assert!(visible_to(approved, None).is_some());
    }

    #[test]
    fn saved_auctions_stay_private() {
        let owner = Uuid::new_v4();
        let saved = || {
            ChangeEvent::new(
                Table::SavedAuctions,
                ChangeKind::Insert,
                Uuid::new_v4(),
                serde_json::json!({ "user_id": owner.to_string(), "auction_id": Uuid::new_v4().to_string() }),
            )
            .with_affected_users(vec![owner])
        };
        assert!(visible_to(saved(), None).is_none());
        assert!(visible_to(saved(), Some(Viewer { id: owner, is_admin: false })).is_some());
    }
}
