/// 판매자 출품 관리
/// 1. 출품 (재출품 포함)
/// 2. 수정: 본인 + 심사 대기 중일 때만
/// 3. 철회: 이미지 삭제 -> 행 삭제 -> 확인 메일
/// 4. 거절된 출품으로 재출품 양식 채우기
// region:    --- Imports
use crate::auction::events::{ChangeEvent, ChangeKind, Table};
use crate::auction::model::{ApprovalStatus, Auction};
use crate::auction::submission::{SubmissionForm, SubmissionRules, ValidSubmission};
use crate::catalog;
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::media::{self, ObjectStorage};
use crate::notify::{self, Mailer, WithdrawalEmail};
use crate::profiles::Profile;
use crate::query::handlers;
use chrono::Utc;
use serde::Serialize;
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Queries
const INSERT_SUBMISSION: &str = r#"
    INSERT INTO auctions (
        title, category, description, starting_price, current_bid, minimum_increment,
        status, approval_status, image_urls, specifications, certificates, end_time,
        submitted_by, original_submission_id
    )
    VALUES ($1, $2, $3, $4, $4, $5, 'pending', 'pending', $6, $7, $8, $9, $10, $11)
    RETURNING *
"#;

const UPDATE_SUBMISSION: &str = r#"
    UPDATE auctions
    SET title = $3, category = $4, description = $5, starting_price = $6, current_bid = $6,
        minimum_increment = $7, image_urls = $8, specifications = $9, certificates = $10,
        end_time = $11, updated_at = now()
    WHERE id = $1 AND submitted_by = $2 AND approval_status = 'pending'
    RETURNING *
"#;

const DELETE_SUBMISSION: &str = r#"
    DELETE FROM auctions
    WHERE id = $1 AND submitted_by = $2 AND approval_status = 'pending'
"#;

// endregion: --- Queries

/// 재출품 양식 응답
#[derive(Debug, Serialize)]
pub struct ResubmissionDraft {
    pub form: SubmissionForm,
    pub rejection_reason: Option<String>,
    pub admin_comments: Option<String>,
}

/// 출품 작업에 필요한 외부 연결
pub struct SubmissionDesk<'a> {
    pub db_manager: &'a DatabaseManager,
    pub publisher: &'a dyn ChangePublisher,
    pub storage: &'a dyn ObjectStorage,
    pub mailer: &'a dyn Mailer,
    pub config: &'a Config,
}

impl SubmissionDesk<'_> {
    fn rules(&self) -> SubmissionRules {
        SubmissionRules {
            default_minimum_increment: self.config.bidding.default_minimum_increment,
            max_images: self.config.uploads.max_images,
        }
    }

    /// 활성 카테고리인지 확인
    async fn ensure_category(&self, slug: &str) -> AppResult<()> {
        let directory = catalog::directory(self.db_manager).await?;
        if !directory.contains(slug) {
            return Err(AppError::validation(format!(
                "알 수 없는 카테고리입니다: {}",
                slug
            )));
        }
        Ok(())
    }

    /// 본인 출품 조회
    async fn own_submission(&self, user: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        let auction = handlers::get_auction(self.db_manager, auction_id).await?;
        if auction.submitted_by != user.id {
            return Err(AppError::forbidden("본인의 출품만 관리할 수 있습니다."));
        }
        Ok(auction)
    }

    /// 본인 + 심사 대기 중인 출품 조회
    async fn own_pending_submission(&self, user: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        let auction = self.own_submission(user, auction_id).await?;
        if auction.approval_status != ApprovalStatus::Pending {
            return Err(AppError::conflict(
                "NOT_PENDING",
                "심사 대기 중인 출품만 수정하거나 철회할 수 있습니다.",
            ));
        }
        Ok(auction)
    }

    /// 본인 + 거절된 출품 조회 (재출품 원본)
    async fn own_rejected_submission(&self, user: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        let auction = self.own_submission(user, auction_id).await?;
        if auction.approval_status != ApprovalStatus::Rejected {
            return Err(AppError::conflict(
                "NOT_REJECTED",
                "거절된 출품만 다시 출품할 수 있습니다.",
            ));
        }
        Ok(auction)
    }

    /// 출품
    pub async fn submit(&self, user: &Profile, form: SubmissionForm) -> AppResult<Auction> {
        info!("{:<12} --> 출품 요청 user: {}", "Submission", user.id);
        let valid = form.validate(self.rules(), &[], Utc::now())?;
        media::ensure_owned_images(&valid.image_urls, self.storage.bucket(), user.id)?;
        self.ensure_category(&valid.category).await?;
        if let Some(original_id) = valid.original_submission_id {
            self.own_rejected_submission(user, original_id).await?;
        }

        let auction = bind_submission(sqlx::query_as::<_, Auction>(INSERT_SUBMISSION), &valid)
            .bind(valid.end_time)
            .bind(user.id)
            .bind(valid.original_submission_id)
            .fetch_one(self.db_manager.pool())
            .await?;

        info!(
            "{:<12} --> 출품 완료 id: {}, 재출품: {}",
            "Submission",
            auction.id,
            auction.is_resubmission()
        );
        self.publish(ChangeKind::Insert, &auction).await;
        Ok(auction)
    }

    /// 출품 수정
    /// 새 이미지가 없으면 기존 이미지를 유지하고, 빠진 이미지는 저장소에서 지운다.
    pub async fn edit(&self, user: &Profile, auction_id: Uuid, form: SubmissionForm) -> AppResult<Auction> {
        info!("{:<12} --> 출품 수정 id: {}", "Submission", auction_id);
        let existing = self.own_pending_submission(user, auction_id).await?;
        let valid = form.validate(self.rules(), &existing.image_urls, Utc::now())?;
        media::ensure_owned_images(&valid.image_urls, self.storage.bucket(), user.id)?;
        if valid.category != existing.category {
            self.ensure_category(&valid.category).await?;
        }

        let query = sqlx::query_as::<_, Auction>(UPDATE_SUBMISSION)
            .bind(auction_id)
            .bind(user.id);
        let updated = bind_submission(query, &valid)
            .bind(valid.end_time)
            .fetch_optional(self.db_manager.pool())
            .await?
            .ok_or_else(|| {
                AppError::conflict("NOT_PENDING", "심사가 시작된 출품은 수정할 수 없습니다.")
            })?;

        let removed: Vec<String> = existing
            .image_urls
            .into_iter()
            .filter(|url| !updated.image_urls.contains(url))
            .collect();
        media::delete_images_or_warn(self.storage, user.id, &removed).await;

        self.publish(ChangeKind::Update, &updated).await;
        Ok(updated)
    }

    /// 출품 철회
    /// 이미지 삭제와 메일 실패는 기록만 하고 철회는 계속한다.
    pub async fn withdraw(&self, user: &Profile, auction_id: Uuid) -> AppResult<()> {
        info!("{:<12} --> 출품 철회 id: {}", "Submission", auction_id);
        let auction = self.own_pending_submission(user, auction_id).await?;

        media::delete_images_or_warn(self.storage, auction.submitted_by, &auction.image_urls).await;

        let deleted = sqlx::query(DELETE_SUBMISSION)
            .bind(auction_id)
            .bind(user.id)
            .execute(self.db_manager.pool())
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(AppError::conflict(
                "NOT_PENDING",
                "심사가 시작된 출품은 철회할 수 없습니다.",
            ));
        }

        if let Some(user_email) = user.email.clone() {
            let user_name = user.full_name.clone().unwrap_or_else(|| user_email.clone());
            let email = WithdrawalEmail::for_auction(user_email, user_name, &auction);
            notify::warn_on_failure(self.mailer.send_withdrawal_email(&email).await, "출품 철회");
        }

        self.publish(ChangeKind::Delete, &auction).await;
        Ok(())
    }

    /// 재출품 양식
    pub async fn resubmission_draft(&self, user: &Profile, auction_id: Uuid) -> AppResult<ResubmissionDraft> {
        let rejected = self.own_rejected_submission(user, auction_id).await?;
        Ok(ResubmissionDraft {
            form: SubmissionForm::resubmission_of(&rejected),
            rejection_reason: rejected.rejection_reason.clone(),
            admin_comments: rejected.admin_comparison_comments.clone(),
        })
    }

    async fn publish(&self, kind: ChangeKind, auction: &Auction) {
        let payload = serde_json::json!({
            "id": auction.id,
            "title": auction.title,
            "status": auction.status.as_str(),
            "approval_status": auction.approval_status.as_str(),
            "submitted_by": auction.submitted_by,
        });
        publish_or_warn(
            self.publisher,
            ChangeEvent::new(Table::Auctions, kind, auction.id, payload)
                .with_affected_users(vec![auction.submitted_by]),
        )
        .await;
    }
}

type AuctionQuery<'q> = sqlx::query::QueryAs<'q, sqlx::Postgres, Auction, sqlx::postgres::PgArguments>;

/// 공통 컬럼 바인딩: 제목 ~ 인증서 (insert/update 순서 동일)
fn bind_submission<'q>(query: AuctionQuery<'q>, valid: &'q ValidSubmission) -> AuctionQuery<'q> {
    query
        .bind(&valid.title)
        .bind(&valid.category)
        .bind(&valid.description)
        .bind(valid.starting_price)
        .bind(valid.minimum_increment)
        .bind(&valid.image_urls)
        .bind(valid.specifications.as_ref().map(Json))
        .bind(valid.certificates.as_ref().map(Json))
}
