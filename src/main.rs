// region:    --- Imports
use jewel_auction_service::change_feed::{ChangeConsumer, ChangeHub, ChangePublisher, HubPublisher};
use jewel_auction_service::config::Config;
use jewel_auction_service::database::DatabaseManager;
use jewel_auction_service::media::HttpObjectStorage;
use jewel_auction_service::message_broker::KafkaManager;
use jewel_auction_service::notify::{HttpMailer, Mailer, NoopMailer};
use jewel_auction_service::scheduler::AuctionScheduler;
use jewel_auction_service::{router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
// endregion: --- Imports

const DEFAULT_CONFIG_PATH: &str = "auction.toml";

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config_path =
        std::env::var("AUCTION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Arc::new(Config::load(&config_path)?);

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new(&config.database).await?);

    // 데이터베이스 초기화
    if config.database.initialize_schema {
        if let Err(e) = db_manager.initialize_database().await {
            error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
    }

    // 변경 알림: Kafka를 쓰면 토픽을 거쳐 허브로, 아니면 허브로 바로 보낸다
    let hub = ChangeHub::new();
    let publisher: Arc<dyn ChangePublisher> = if config.kafka.enabled {
        let kafka_manager = KafkaManager::new(&config.kafka)?;
        if let Err(e) = kafka_manager.initialize().await {
            error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
            return Err(e.into());
        }
        info!("{:<12} --> Kafka 초기화 성공", "Main");

        // 토픽 생성
        kafka_manager.create_topic(&config.kafka.topic, 5, 1).await?;

        // 변경 이벤트 소비 시작
        let change_consumer =
            ChangeConsumer::new(hub.clone(), kafka_manager.get_consumer(), &config.kafka.topic);
        tokio::spawn(async move {
            change_consumer.start().await;
        });
        kafka_manager.get_producer()
    } else {
        warn!("{:<12} --> Kafka 꺼짐, 프로세스 내부 허브만 사용", "Main");
        Arc::new(HubPublisher::new(hub.clone()))
    };

    // 경매 마감 스케줄러
    let scheduler = AuctionScheduler::new(db_manager.get_pool(), Arc::clone(&publisher));
    scheduler.start().await;

    let mailer: Arc<dyn Mailer> = if config.mailer.enabled {
        Arc::new(HttpMailer::new(&config.mailer))
    } else {
        Arc::new(NoopMailer)
    };

    let state = AppState {
        db: db_manager,
        publisher,
        hub,
        storage: Arc::new(HttpObjectStorage::new(&config.storage)),
        mailer,
        config: Arc::clone(&config),
    };

    // 프런트엔드 개발 서버를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // 리스너 생성
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
