use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use jewel_auction_service::auction::events::{ChangeEvent, ChangeKind, Table};
use jewel_auction_service::change_feed::{ChangeHub, HubPublisher};
use jewel_auction_service::config::Config;
use jewel_auction_service::database::DatabaseManager;
use jewel_auction_service::media::HttpObjectStorage;
use jewel_auction_service::notify::NoopMailer;
use jewel_auction_service::{router, AppState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 데이터베이스 없이 라우터 구성
/// 풀은 첫 쿼리에서 연결하므로 인증 실패나 경로 오류처럼 DB 전에 끝나는 요청만 다룬다.
fn setup() -> (axum::Router, ChangeHub) {
    init_tracing();
    let config = Config::default();
    let db_manager = DatabaseManager::connect_lazy(&config.database).unwrap();
    let hub = ChangeHub::new();
    let state = AppState {
        db: Arc::new(db_manager),
        publisher: Arc::new(HubPublisher::new(hub.clone())),
        hub: hub.clone(),
        storage: Arc::new(HttpObjectStorage::new(&config.storage)),
        mailer: Arc::new(NoopMailer),
        config: Arc::new(config),
    };
    (router(state), hub)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = setup();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn bidding_requires_a_signed_in_user() {
    let (app, _) = setup();
    let request = Request::builder()
        .method("POST")
        .uri(format!("/auctions/{}/bids", Uuid::new_v4()))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"bid_amount": 1500}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_user_header_is_unauthorized() {
    let (app, _) = setup();
    let request = Request::builder()
        .uri("/admin/auctions")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_routes_require_a_user() {
    for uri in ["/me", "/me/dashboard", "/me/watchlist"] {
        let (app, _) = setup();
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn uploads_require_a_user() {
    let (app, _) = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/uploads?file_name=ring.jpg&draft_id=draft-1")
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0u8; 16]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_auction_id_is_a_bad_request() {
    let (app, _) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/auctions/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_upload_query_is_a_validation_error() {
    let (app, _) = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/uploads")
        .header("content-type", "image/jpeg")
        .body(Body::from(vec![0u8; 16]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn bid_on_malformed_auction_id_is_a_validation_error() {
    let (app, _) = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/auctions/12345/bids")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"bid_amount": 1500}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    // 경로 해석이 인증보다 먼저 실패한다
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn user_change_feed_needs_that_user() {
    let (app, _) = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/changes?user={}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_feed_streams_matching_events() {
    let (app, hub) = setup();
    let auction_id = Uuid::new_v4();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/changes?table=auctions&id={}", auction_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    // 다른 경매 이벤트는 걸러지고, 구독한 경매 이벤트만 온다
    hub.broadcast(ChangeEvent::auction_status(Uuid::new_v4(), "paused", "approved"));
    hub.broadcast(ChangeEvent::auction_status(auction_id, "paused", "approved"));

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("이벤트 대기 시간 초과")
        .unwrap()
        .unwrap();
    let data = frame.into_data().unwrap();
    let text = String::from_utf8(data.to_vec()).unwrap();
    assert!(text.contains("event: change"));
    assert!(text.contains(&auction_id.to_string()));
    assert!(text.contains("paused"));
}

#[tokio::test]
async fn anonymous_bid_feed_hides_bidder_ids() {
    let (app, hub) = setup();
    let auction_id = Uuid::new_v4();
    let bidder = Uuid::new_v4();
    let outbid = Uuid::new_v4();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/changes?table=bids&id={}", auction_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    hub.broadcast(
        ChangeEvent::new(
            Table::Bids,
            ChangeKind::Insert,
            Uuid::new_v4(),
            serde_json::json!({
                "auction_id": auction_id.to_string(),
                "user_id": bidder.to_string(),
                "bid_amount": 1500,
            }),
        )
        .with_affected_users(vec![outbid]),
    );

    let mut body = response.into_body();
    let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
        .await
        .expect("이벤트 대기 시간 초과")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("Bidder #"));
    assert!(text.contains("1500"));
    assert!(!text.contains(&bidder.to_string()));
    assert!(!text.contains(&outbid.to_string()));
}
