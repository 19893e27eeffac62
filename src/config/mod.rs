/// 서비스 설정
/// TOML 파일(선택)을 읽고 환경 변수로 덮어쓴다.
// region:    --- Imports
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

// endregion: --- Imports

// region:    --- Config Model
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    #[serde(default)]
    pub bidding: BiddingConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 요청 바디 최대 크기(바이트)
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    1024 * 1024 * 20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 시작 시 스키마 생성 여부
    #[serde(default = "default_true")]
    pub initialize_schema: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            initialize_schema: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// false면 변경 이벤트를 프로세스 내부 허브로만 전달한다
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_brokers")]
    pub brokers: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    /// 인스턴스마다 `{group_id}-{uuid}` 그룹으로 구독해 모든 파티션을 받는다
    #[serde(default = "default_group_id")]
    pub group_id: String,
}

fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_topic() -> String {
    "changes".to_string()
}

fn default_group_id() -> String {
    "changes-group".to_string()
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brokers: default_brokers(),
            topic: default_topic(),
            group_id: default_group_id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub service_key: String,
}

fn default_storage_url() -> String {
    "http://localhost:54321/storage/v1".to_string()
}

fn default_bucket() -> String {
    "auction-images".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_url(),
            bucket: default_bucket(),
            service_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_functions_url")]
    pub functions_url: String,
    #[serde(default)]
    pub api_key: String,
}

fn default_functions_url() -> String {
    "http://localhost:54321/functions/v1".to_string()
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            functions_url: default_functions_url(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BiddingConfig {
    /// 최소 증가액이 없는 경매에 적용되는 기본값
    #[serde(default = "default_increment")]
    pub default_minimum_increment: i64,
}

fn default_increment() -> i64 {
    100
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            default_minimum_increment: default_increment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

fn default_max_bytes() -> usize {
    5_242_880
}

fn default_allowed_mime_types() -> Vec<String> {
    ["image/jpeg", "image/jpg", "image/png", "image/webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_images() -> usize {
    10
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
            max_images: default_max_images(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// 게이트웨이가 인증된 사용자 id를 넣어주는 헤더
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
        }
    }
}

// endregion: --- Config Model

// region:    --- Loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("설정 파일 읽기 실패: {0}")]
    Io(#[from] std::io::Error),
    #[error("설정 파일 파싱 실패: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("잘못된 환경 변수 {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

impl Config {
    /// 설정 로드
    /// 파일이 없으면 기본값에서 시작한다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            info!("{:<12} --> 설정 파일 로드: {}", "Config", path.display());
            let raw = std::fs::read_to_string(path)?;
            Self::from_toml(&raw)?
        } else {
            info!("{:<12} --> 설정 파일 없음, 기본값 사용", "Config");
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// 환경 변수 덮어쓰기
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(brokers) = lookup("KAFKA_BROKERS") {
            self.kafka.brokers = brokers;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SERVER_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(url) = lookup("STORAGE_URL") {
            self.storage.base_url = url;
        }
        if let Some(key) = lookup("STORAGE_KEY") {
            self.storage.service_key = key;
        }
        if let Some(url) = lookup("FUNCTIONS_URL") {
            self.mailer.functions_url = url;
        }
        if let Some(key) = lookup("FUNCTIONS_KEY") {
            self.mailer.api_key = key;
        }
        Ok(())
    }
}

// endregion: --- Loading

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_marketplace_rules() {
        let config = Config::default();
        assert_eq!(config.uploads.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.uploads.max_images, 10);
        assert_eq!(config.bidding.default_minimum_increment, 100);
        assert_eq!(config.storage.bucket, "auction-images");
        assert_eq!(config.auth.user_header, "x-user-id");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 8080

            [kafka]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(!config.kafka.enabled);
        assert_eq!(config.kafka.topic, "changes");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://localhost/auction"),
            ("SERVER_PORT", "4000"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.url, "postgres://localhost/auction");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn bad_port_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_env(|name| (name == "SERVER_PORT").then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "SERVER_PORT", .. }));
    }
}
