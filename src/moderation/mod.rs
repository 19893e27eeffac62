/// 관리자 심사
/// 1. 승인 / 거절 (사유 필수)
/// 2. 시작 / 일시 중지
/// 3. 재출품 비교 및 비교 코멘트
/// 4. 관리자 활동 기록
// region:    --- Imports
use crate::auction::comparison::ResubmissionComparison;
use crate::auction::events::ChangeEvent;
use crate::auction::model::{ApprovalGroups, ApprovalStatus, Auction, AuctionStatus};
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use crate::notify::{self, AuctionStatusEmail, Mailer, StatusDecision};
use crate::profiles::{self, Profile};
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

const ACTIVITY_LIMIT: i64 = 100;

// region:    --- Transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Approve,
    Reject,
    Start,
    Pause,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::Approve => "approve",
            ModerationAction::Reject => "reject",
            ModerationAction::Start => "start",
            ModerationAction::Pause => "pause",
        }
    }

    /// 현재 상태에서 이 작업을 적용한 뒤의 (상태, 승인 상태)
    pub fn transition(
        &self,
        status: AuctionStatus,
        approval_status: ApprovalStatus,
    ) -> AppResult<(AuctionStatus, ApprovalStatus)> {
        match self {
            ModerationAction::Approve | ModerationAction::Reject
                if approval_status != ApprovalStatus::Pending =>
            {
                Err(AppError::conflict(
                    "INVALID_TRANSITION",
                    format!("이미 심사가 끝난 경매입니다. (현재: {})", approval_status),
                ))
            }
            ModerationAction::Approve => Ok((AuctionStatus::Active, ApprovalStatus::Approved)),
            ModerationAction::Reject => Ok((AuctionStatus::Rejected, ApprovalStatus::Rejected)),
            ModerationAction::Start | ModerationAction::Pause
                if approval_status != ApprovalStatus::Approved =>
            {
                Err(AppError::conflict(
                    "NOT_APPROVED",
                    "승인된 경매만 시작하거나 일시 중지할 수 있습니다.",
                ))
            }
            ModerationAction::Start => match status {
                AuctionStatus::Paused | AuctionStatus::Pending | AuctionStatus::Draft => {
                    Ok((AuctionStatus::Active, approval_status))
                }
                other => Err(AppError::conflict(
                    "INVALID_TRANSITION",
                    format!("{} 상태의 경매는 시작할 수 없습니다.", other),
                )),
            },
            ModerationAction::Pause => match status {
                AuctionStatus::Active => Ok((AuctionStatus::Paused, approval_status)),
                other => Err(AppError::conflict(
                    "INVALID_TRANSITION",
                    format!("{} 상태의 경매는 일시 중지할 수 없습니다.", other),
                )),
            },
        }
    }
}

impl fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 거절 사유
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

/// 비교 코멘트
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsRequest {
    #[serde(default)]
    pub comments: Option<String>,
}

// endregion: --- Transitions

// region:    --- Views
/// 관리자 목록: 승인 상태별 경매 + 재출품의 원본
#[derive(Debug, Serialize)]
pub struct ModerationOverview {
    #[serde(flatten)]
    pub groups: ApprovalGroups,
    pub originals: Vec<Auction>,
}

/// 관리자 활동
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminActivity {
    pub id: Uuid,
    pub admin_user_id: Uuid,
    pub admin_name: Option<String>,
    pub auction_id: Uuid,
    pub action_type: String,
    pub auction_title: String,
    pub created_at: DateTime<Utc>,
}

// endregion: --- Views

// region:    --- Queries
const APPLY_TRANSITION: &str = r#"
    UPDATE auctions
    SET status = $3,
        approval_status = $4,
        rejection_reason = CASE WHEN $4 = 'rejected' THEN $5 ELSE rejection_reason END,
        approved_by = CASE WHEN $6 THEN $7 ELSE approved_by END,
        approved_at = CASE WHEN $6 THEN now() ELSE approved_at END,
        updated_at = now()
    WHERE id = $1 AND status = $2 AND approval_status = $8
    RETURNING *
"#;

const INSERT_ACTIVITY: &str = r#"
    INSERT INTO admin_activity_log (admin_user_id, auction_id, action_type, auction_title)
    VALUES ($1, $2, $3, $4)
"#;

const GET_ACTIVITY: &str = r#"
    SELECT l.id, l.admin_user_id, COALESCE(p.full_name, p.email) AS admin_name,
           l.auction_id, l.action_type, l.auction_title, l.created_at
    FROM admin_activity_log l
    LEFT JOIN profiles p ON p.id = l.admin_user_id
    ORDER BY l.created_at DESC
    LIMIT $1
"#;

const SAVE_COMMENTS: &str = r#"
    UPDATE auctions SET admin_comparison_comments = $2, updated_at = now()
    WHERE id = $1
    RETURNING *
"#;

/// 관리자 목록 조회
pub async fn overview(db_manager: &DatabaseManager) -> AppResult<ModerationOverview> {
    let auctions = handlers::get_all_auctions(db_manager).await?;
    let originals = handlers::get_originals_for(db_manager, &auctions).await?;
    Ok(ModerationOverview {
        groups: ApprovalGroups::group(auctions),
        originals,
    })
}

/// 재출품 비교
pub async fn comparison(
    db_manager: &DatabaseManager,
    auction_id: Uuid,
) -> AppResult<ResubmissionComparison> {
    let resubmitted = handlers::get_auction(db_manager, auction_id).await?;
    let original_id = resubmitted.original_submission_id.ok_or_else(|| {
        AppError::validation("재출품이 아닌 경매는 비교할 수 없습니다.")
    })?;
    let original = handlers::find_auction(db_manager, original_id)
        .await?
        .ok_or_else(|| AppError::not_found("원본 출품"))?;
    Ok(ResubmissionComparison::new(original, resubmitted))
}

/// 비교 코멘트 저장, 빈 값은 지운다
pub async fn save_comments(
    db_manager: &DatabaseManager,
    auction_id: Uuid,
    request: CommentsRequest,
) -> AppResult<Auction> {
    info!("{:<12} --> 비교 코멘트 저장 id: {}", "Moderation", auction_id);
    let comments = request
        .comments
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    sqlx::query_as::<_, Auction>(SAVE_COMMENTS)
        .bind(auction_id)
        .bind(comments)
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or_else(|| AppError::not_found("경매"))
}

/// 관리자 활동 조회
pub async fn recent_activity(db_manager: &DatabaseManager) -> AppResult<Vec<AdminActivity>> {
    let activity = sqlx::query_as::<_, AdminActivity>(GET_ACTIVITY)
        .bind(ACTIVITY_LIMIT)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(activity)
}

// endregion: --- Queries

// region:    --- Commands
/// 심사 작업에 필요한 외부 연결
pub struct Moderator<'a> {
    pub db_manager: &'a DatabaseManager,
    pub publisher: &'a dyn ChangePublisher,
    pub mailer: &'a dyn Mailer,
}

impl Moderator<'_> {
    pub async fn approve(&self, admin: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        self.apply(admin, auction_id, ModerationAction::Approve, None).await
    }

    pub async fn reject(
        &self,
        admin: &Profile,
        auction_id: Uuid,
        request: RejectRequest,
    ) -> AppResult<Auction> {
        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::validation("거절 사유를 입력해 주세요."));
        }
        self.apply(admin, auction_id, ModerationAction::Reject, Some(reason))
            .await
    }

    pub async fn start(&self, admin: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        self.apply(admin, auction_id, ModerationAction::Start, None).await
    }

    pub async fn pause(&self, admin: &Profile, auction_id: Uuid) -> AppResult<Auction> {
        self.apply(admin, auction_id, ModerationAction::Pause, None).await
    }

    /// 상태 전이 적용
    /// 읽은 시점의 상태가 그대로일 때만 갱신하고, 같은 트랜잭션에서 활동을 기록한다.
    async fn apply(
        &self,
        admin: &Profile,
        auction_id: Uuid,
        action: ModerationAction,
        reason: Option<String>,
    ) -> AppResult<Auction> {
        info!(
            "{:<12} --> {} 요청 auction: {}, admin: {}",
            "Moderation", action, auction_id, admin.id
        );
        let current = handlers::get_auction(self.db_manager, auction_id).await?;
        let (next_status, next_approval) =
            action.transition(current.status, current.approval_status)?;

        let admin_id = admin.id;
        let approving = action == ModerationAction::Approve;
        let from_status = current.status;
        let from_approval = current.approval_status;

        let updated = self
            .db_manager
            .transaction::<_, Option<Auction>, AppError>(|tx| {
                Box::pin(async move {
                    let updated = sqlx::query_as::<_, Auction>(APPLY_TRANSITION)
                        .bind(auction_id)
                        .bind(from_status.as_str())
                        .bind(next_status.as_str())
                        .bind(next_approval.as_str())
                        .bind(reason)
                        .bind(approving)
                        .bind(admin_id)
                        .bind(from_approval.as_str())
                        .fetch_optional(&mut **tx)
                        .await?;
                    let Some(updated) = updated else {
                        return Ok(None);
                    };

                    sqlx::query(INSERT_ACTIVITY)
                        .bind(admin_id)
                        .bind(auction_id)
                        .bind(action.as_str())
                        .bind(&updated.title)
                        .execute(&mut **tx)
                        .await?;
                    Ok(Some(updated))
                })
            })
            .await?;

        let updated = updated.ok_or_else(|| {
            AppError::conflict(
                "STALE_STATE",
                "다른 관리자가 먼저 상태를 변경했습니다. 새로 고친 뒤 다시 시도해 주세요.",
            )
        })?;

        info!(
            "{:<12} --> {} 완료 auction: {}, status: {}, approval: {}",
            "Moderation", action, auction_id, updated.status, updated.approval_status
        );

        publish_or_warn(
            self.publisher,
            ChangeEvent::auction_status(
                updated.id,
                updated.status.as_str(),
                updated.approval_status.as_str(),
            )
            .with_affected_users(vec![updated.submitted_by]),
        )
        .await;

        match action {
            ModerationAction::Approve => self.notify_submitter(&updated, StatusDecision::Approved).await,
            ModerationAction::Reject => self.notify_submitter(&updated, StatusDecision::Rejected).await,
            ModerationAction::Start | ModerationAction::Pause => {}
        }

        Ok(updated)
    }

    /// 출품자에게 심사 결과 메일 발송, 이메일이 없으면 생략
    async fn notify_submitter(&self, auction: &Auction, decision: StatusDecision) {
        let submitter = match profiles::find_profile(self.db_manager, auction.submitted_by).await {
            Ok(profile) => profile,
            Err(e) => {
                notify::warn_on_failure(Err(e), "심사 결과");
                return;
            }
        };
        let Some(submitter) = submitter else {
            return;
        };
        let Some(user_email) = submitter.email.clone() else {
            return;
        };
        let email = AuctionStatusEmail {
            user_name: submitter
                .full_name
                .clone()
                .unwrap_or_else(|| user_email.clone()),
            user_email,
            auction_title: auction.title.clone(),
            status: decision,
            rejection_reason: auction.rejection_reason.clone(),
            auction_id: auction.id.to_string(),
        };
        notify::warn_on_failure(self.mailer.send_status_email(&email).await, "심사 결과");
    }
}

// endregion: --- Commands

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_and_reject_need_pending_review() {
        assert_eq!(
            ModerationAction::Approve
                .transition(AuctionStatus::Pending, ApprovalStatus::Pending)
                .unwrap(),
            (AuctionStatus::Active, ApprovalStatus::Approved)
        );
        assert_eq!(
            ModerationAction::Reject
                .transition(AuctionStatus::Pending, ApprovalStatus::Pending)
                .unwrap(),
            (AuctionStatus::Rejected, ApprovalStatus::Rejected)
        );
        let err = ModerationAction::Approve
            .transition(AuctionStatus::Active, ApprovalStatus::Approved)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[test]
    fn start_and_pause_toggle_approved_auctions() {
        assert_eq!(
            ModerationAction::Pause
                .transition(AuctionStatus::Active, ApprovalStatus::Approved)
                .unwrap(),
            (AuctionStatus::Paused, ApprovalStatus::Approved)
        );
        assert_eq!(
            ModerationAction::Start
                .transition(AuctionStatus::Paused, ApprovalStatus::Approved)
                .unwrap(),
            (AuctionStatus::Active, ApprovalStatus::Approved)
        );
        assert!(ModerationAction::Start
            .transition(AuctionStatus::Ended, ApprovalStatus::Approved)
            .is_err());
        assert!(ModerationAction::Pause
            .transition(AuctionStatus::Paused, ApprovalStatus::Approved)
            .is_err());
    }

    #[test]
    fn unapproved_auctions_cannot_be_started() {
        let err = ModerationAction::Start
            .transition(AuctionStatus::Pending, ApprovalStatus::Pending)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_APPROVED");
        assert!(ModerationAction::Pause
            .transition(AuctionStatus::Active, ApprovalStatus::Rejected)
            .is_err());
    }
}
