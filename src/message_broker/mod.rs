// region:    --- Imports
use crate::auction::events::ChangeEvent;
use crate::change_feed::ChangePublisher;
use crate::config::KafkaConfig;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// endregion: --- Imports

const INIT_TOPIC: &str = "init-topic";
const INIT_GROUP: &str = "init-group";
const INIT_MESSAGE: &str = "init-message";

/// 인스턴스 전용 컨슈머 그룹
/// 변경 알림은 인스턴스마다 모든 파티션을 받아야 하므로 그룹을 나누어 쓴다.
pub fn instance_group_id(base: &str) -> String {
    format!("{}-{}", base, Uuid::new_v4())
}

/// 어디서부터 읽을지
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFrom {
    Earliest,
    Latest,
}

impl StartFrom {
    fn as_str(&self) -> &'static str {
        match self {
            StartFrom::Earliest => "earliest",
            StartFrom::Latest => "latest",
        }
    }
}

fn consumer_config(brokers: &str, group_id: &str, start_from: StartFrom) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", brokers)
        .set("group.id", group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", start_from.as_str())
        .set("session.timeout.ms", "6000")
        .set("fetch.max.bytes", "5242880")
        .set("allow.auto.create.topics", "true");
    config
}

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            topic: topic.to_string(),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), String> {
        debug!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}

/// 레코드 id를 키로 써서 같은 레코드의 변경은 같은 파티션으로 보낸다
#[async_trait]
impl ChangePublisher for KafkaProducer {
    async fn publish(&self, event: ChangeEvent) -> Result<(), String> {
        let key = event.record_id.to_string();
        let value = serde_json::to_string(&event).map_err(|e| e.to_string())?;
        self.send_message(&self.topic, &key, &value).await
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send>>;

pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

/// KafkaConsumer 구현
impl KafkaConsumer {
    /// 실시간 알림용: 구독 시점 이후 이벤트만 읽는다
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, KafkaError> {
        Self::with_start(brokers, group_id, StartFrom::Latest)
    }

    pub fn with_start(brokers: &str, group_id: &str, start_from: StartFrom) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = consumer_config(brokers, group_id, start_from).create()?;
        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// 변경 이벤트 소비
    pub async fn consume_events<F>(&self, topic: &str, handler: F) -> Result<(), KafkaError>
    where
        F: Fn(ChangeEvent) -> HandlerFuture + Send + 'static,
    {
        info!(
            "{:<12} --> Kafka 변경 이벤트 구독 시작: topic={}",
            "Consumer", topic
        );
        self.consumer.subscribe(&[topic])?;

        loop {
            match self.consumer.recv().await {
                Ok(message) => {
                    debug!(
                        "{:<12} --> 메시지 수신: topic={}, partition={}, offset={}",
                        "Consumer",
                        message.topic(),
                        message.partition(),
                        message.offset()
                    );

                    let Some(payload) = message.payload() else {
                        warn!("{:<12} --> 빈 페이로드 수신", "Consumer");
                        continue;
                    };
                    match serde_json::from_slice::<ChangeEvent>(payload) {
                        Ok(event) => {
                            if let Err(e) = handler(event).await {
                                error!(
                                    "{:<12} --> Kafka 이벤트 처리 오류: {:?}",
                                    "Consumer", e
                                );
                            }
                        }
                        Err(e) => error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e),
                    }
                }
                Err(e) => error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e),
            }
        }
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    consumer: Arc<KafkaConsumer>,
    brokers: String,
}

/// KafkaManager 구현
impl KafkaManager {
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let producer = Arc::new(KafkaProducer::new(&config.brokers, &config.topic)?);
        let group_id = instance_group_id(&config.group_id);
        info!("{:<12} --> 컨슈머 그룹: {}", "Manager", group_id);
        let consumer = Arc::new(KafkaConsumer::new(&config.brokers, &group_id)?);

        Ok(KafkaManager {
            producer,
            consumer,
            brokers: config.brokers.clone(),
        })
    }

    /// 프로듀서 반환
    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    /// 컨슈머 반환
    pub fn get_consumer(&self) -> Arc<KafkaConsumer> {
        Arc::clone(&self.consumer)
    }

    /// Kafka 초기화
    /// 초기화 토픽으로 메시지를 왕복시켜 브로커 연결을 확인한다.
    /// 왕복용 컨슈머는 새 그룹으로 처음부터 읽으므로, 파티션 배정이 전송보다 늦어도 메시지를 받는다.
    pub async fn initialize(&self) -> Result<(), String> {
        info!("{:<12} --> Kafka 초기화 시작", "Manager");

        let round_trip_key = Uuid::new_v4().to_string();
        let init_consumer = KafkaConsumer::with_start(
            &self.brokers,
            &instance_group_id(INIT_GROUP),
            StartFrom::Earliest,
        )
        .map_err(|e| e.to_string())?;
        init_consumer
            .consumer
            .subscribe(&[INIT_TOPIC])
            .map_err(|e| e.to_string())?;

        self.producer
            .send_message(INIT_TOPIC, &round_trip_key, INIT_MESSAGE)
            .await?;

        let mut attempts = 0;
        let max_attempts = 10;
        loop {
            if attempts >= max_attempts {
                return Err("Kafka 초기화 메시지 수신 실패".to_string());
            }
            match time::timeout(Duration::from_secs(1), init_consumer.consumer.recv()).await {
                Ok(Ok(message)) => {
                    // 이전 실행이 남긴 초기화 메시지는 건너뛴다
                    if message.key() == Some(round_trip_key.as_bytes()) {
                        info!("{:<12} --> Kafka 초기화 메시지 수신 확인", "Manager");
                        return Ok(());
                    }
                }
                Ok(Err(e)) => error!(
                    "{:<12} --> Kafka 초기화 메시지 수신 오류: {:?}",
                    "Manager", e
                ),
                Err(_) => {
                    attempts += 1;
                    warn!(
                        "{:<12} --> Kafka 초기화 메시지 수신 대기 중... (시도: {}/{})",
                        "Manager", attempts, max_attempts
                    );
                }
            }
        }
    }

    /// 토픽 생성, 이미 있으면 그대로 둔다
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| format!("토픽 생성 실패: {:?}", e))?;

        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", name),
                Err((name, rdkafka::types::RDKafkaErrorCode::TopicAlreadyExists)) => {
                    info!("{:<12} --> Kafka 토픽 이미 존재: {}", "Manager", name)
                }
                Err((name, code)) => {
                    error!("{:<12} --> Kafka 토픽 생성 실패: {} {:?}", "Manager", name, code);
                    return Err(format!("토픽 생성 실패: {} {:?}", name, code));
                }
            }
        }
        Ok(())
    }
}

// endregion: --- Kafka Manager
