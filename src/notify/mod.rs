/// 메일 발송
/// 외부 서버 함수 두 개를 호출한다.
/// 1. send-auction-status-email: 승인/거절 안내
/// 2. send-submission-withdrawal-email: 출품 철회 확인
// region:    --- Imports
use crate::auction::model::Auction;
use crate::config::MailerConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusDecision {
    Approved,
    Rejected,
}

/// 승인/거절 안내 메일
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionStatusEmail {
    pub user_email: String,
    pub user_name: String,
    pub auction_title: String,
    pub status: StatusDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub auction_id: String,
}

/// 출품 철회 확인 메일
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalEmail {
    pub user_email: String,
    pub user_name: String,
    pub auction_title: String,
    pub auction_id: String,
    pub submitted_date: DateTime<Utc>,
    pub category: String,
    pub description: String,
    pub starting_price: i64,
    pub minimum_increment: i64,
}

impl WithdrawalEmail {
    /// 철회된 출품 내용으로 메일 본문 구성
    pub fn for_auction(user_email: String, user_name: String, auction: &Auction) -> Self {
        Self {
            user_email,
            user_name,
            auction_title: auction.title.clone(),
            auction_id: auction.id.to_string(),
            submitted_date: auction.created_at,
            category: auction.category.clone(),
            description: auction.description.clone(),
            starting_price: auction.starting_price,
            minimum_increment: auction.minimum_increment,
        }
    }
}

// endregion: --- Messages

// region:    --- Mailer
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_status_email(&self, email: &AuctionStatusEmail) -> AppResult<()>;

    async fn send_withdrawal_email(&self, email: &WithdrawalEmail) -> AppResult<()>;
}

/// 메일 실패는 작업을 실패시키지 않는다
pub fn warn_on_failure(result: AppResult<()>, kind: &str) {
    if let Err(e) = result {
        warn!("{:<12} --> {} 메일 발송 실패: {}", "Mailer", kind, e);
    }
}

/// 외부 함수 호출 메일러
pub struct HttpMailer {
    client: Client,
    functions_url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(config: &MailerConfig) -> Self {
        Self {
            client: Client::new(),
            functions_url: config.functions_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn invoke<T: Serialize + Sync>(&self, function: &str, body: &T) -> AppResult<()> {
        let url = format!("{}/{}", self.functions_url, function);
        info!("{:<12} --> 메일 함수 호출: {}", "Mailer", function);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::External {
                service: "mailer",
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::External {
                service: "mailer",
                message: format!("{} {}", status, body),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_status_email(&self, email: &AuctionStatusEmail) -> AppResult<()> {
        self.invoke("send-auction-status-email", email).await
    }

    async fn send_withdrawal_email(&self, email: &WithdrawalEmail) -> AppResult<()> {
        self.invoke("send-submission-withdrawal-email", email).await
    }
}

/// 메일 발송이 꺼져 있을 때
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_status_email(&self, email: &AuctionStatusEmail) -> AppResult<()> {
        info!(
            "{:<12} --> 메일 발송 꺼짐, 상태 안내 생략: {}",
            "Mailer", email.auction_id
        );
        Ok(())
    }

    async fn send_withdrawal_email(&self, email: &WithdrawalEmail) -> AppResult<()> {
        info!(
            "{:<12} --> 메일 발송 꺼짐, 철회 안내 생략: {}",
            "Mailer", email.auction_id
        );
        Ok(())
    }
}

// endregion: --- Mailer
