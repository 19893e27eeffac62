/// 판매자 출품 양식 검증
// region:    --- Imports
use super::model::{Auction, Certificate, Specification};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// endregion: --- Imports

const TITLE_MIN: usize = 5;
const TITLE_MAX: usize = 200;
const DESCRIPTION_MIN: usize = 20;
const DESCRIPTION_MAX: usize = 2000;

// region:    --- Form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecificationInput {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// 출품/수정 요청
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starting_price: i64,
    #[serde(default)]
    pub minimum_increment: Option<i64>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<SpecificationInput>,
    #[serde(default)]
    pub certificates: Vec<CertificateInput>,
    #[serde(default)]
    pub original_submission_id: Option<Uuid>,
}

/// 검증 기준
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRules {
    pub default_minimum_increment: i64,
    pub max_images: usize,
}

/// 검증을 통과한 출품 데이터
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub title: String,
    pub category: String,
    pub description: String,
    pub starting_price: i64,
    pub minimum_increment: i64,
    pub end_time: DateTime<Utc>,
    pub image_urls: Vec<String>,
    pub specifications: Option<Vec<Specification>>,
    pub certificates: Option<Vec<Certificate>>,
    pub original_submission_id: Option<Uuid>,
}

// endregion: --- Form

// region:    --- Validation
impl SubmissionForm {
    /// 양식 검증
    /// `existing_images`는 수정 시 기존 이미지이며, 새 이미지가 없으면 그대로 사용한다.
    /// 모든 오류 메시지를 모아 한 번에 돌려준다.
    pub fn validate(
        self,
        rules: SubmissionRules,
        existing_images: &[String],
        now: DateTime<Utc>,
    ) -> Result<ValidSubmission, AppError> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        let title_len = title.chars().count();
        if title_len < TITLE_MIN {
            errors.push(format!("제목은 {}자 이상이어야 합니다", TITLE_MIN));
        } else if title_len > TITLE_MAX {
            errors.push(format!("제목은 {}자 이하여야 합니다", TITLE_MAX));
        }

        let category = self.category.trim().to_string();
        if category.is_empty() {
            errors.push("카테고리를 선택해 주세요".to_string());
        }

        let description = self.description.trim().to_string();
        let description_len = description.chars().count();
        if description_len < DESCRIPTION_MIN {
            errors.push(format!("설명은 {}자 이상이어야 합니다", DESCRIPTION_MIN));
        } else if description_len > DESCRIPTION_MAX {
            errors.push(format!("설명은 {}자 이하여야 합니다", DESCRIPTION_MAX));
        }

        if self.starting_price < 1 {
            errors.push("시작 가격은 1 이상이어야 합니다".to_string());
        }

        match self.end_time {
            None => errors.push("종료 시각을 선택해 주세요".to_string()),
            Some(end) if end <= now => errors.push("종료 시각은 미래여야 합니다".to_string()),
            Some(_) => {}
        }

        let image_urls: Vec<String> = if self.image_urls.is_empty() {
            existing_images.to_vec()
        } else {
            self.image_urls
        };
        if image_urls.is_empty() {
            errors.push("이미지를 한 장 이상 올려 주세요".to_string());
        } else if image_urls.len() > rules.max_images {
            errors.push(format!("이미지는 최대 {}장까지 가능합니다", rules.max_images));
        }

        if !errors.is_empty() {
            return Err(AppError::validation(errors.join(", ")));
        }

        let minimum_increment = match self.minimum_increment {
            Some(inc) if inc > 0 => inc,
            _ => rules.default_minimum_increment,
        };

        Ok(ValidSubmission {
            title,
            category,
            description,
            starting_price: self.starting_price,
            minimum_increment,
            end_time: self.end_time.unwrap_or(now),
            image_urls,
            specifications: clean_specifications(self.specifications),
            certificates: clean_certificates(self.certificates),
            original_submission_id: self.original_submission_id,
        })
    }
}

/// 빈 칸이 있는 항목은 버리고, 남는 것이 없으면 None
fn clean_specifications(specs: Vec<SpecificationInput>) -> Option<Vec<Specification>> {
    let specs: Vec<Specification> = specs
        .into_iter()
        .filter(|s| !s.label.trim().is_empty() && !s.value.trim().is_empty())
        .map(|s| Specification {
            label: s.label.trim().to_string(),
            value: s.value.trim().to_string(),
        })
        .collect();
    (!specs.is_empty()).then_some(specs)
}

fn clean_certificates(certs: Vec<CertificateInput>) -> Option<Vec<Certificate>> {
    let certs: Vec<Certificate> = certs
        .into_iter()
        .filter(|c| !c.name.trim().is_empty() && !c.issuer.trim().is_empty())
        .map(|c| Certificate {
            name: c.name.trim().to_string(),
            issuer: c.issuer.trim().to_string(),
            date: c
                .date
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
        .collect();
    (!certs.is_empty()).then_some(certs)
}

// endregion: --- Validation

// region:    --- Resubmission
impl SubmissionForm {
    /// 거절된 출품으로 재출품 양식을 채운다
    /// 종료 시각은 다시 고르게 비워 둔다.
    pub fn resubmission_of(rejected: &Auction) -> Self {
        Self {
            title: rejected.title.clone(),
            category: rejected.category.clone(),
            description: rejected.description.clone(),
            starting_price: rejected.starting_price,
            minimum_increment: Some(rejected.minimum_increment),
            end_time: None,
            image_urls: rejected.image_urls.clone(),
            specifications: rejected
                .specification_list()
                .iter()
                .map(|s| SpecificationInput {
                    label: s.label.clone(),
                    value: s.value.clone(),
                })
                .collect(),
            certificates: rejected
                .certificate_list()
                .iter()
                .map(|c| CertificateInput {
                    name: c.name.clone(),
                    issuer: c.issuer.clone(),
                    date: c.date.clone(),
                })
                .collect(),
            original_submission_id: Some(rejected.id),
        }
    }
}

// endregion: --- Resubmission

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const RULES: SubmissionRules = SubmissionRules {
        default_minimum_increment: 100,
        max_images: 10,
    };

    fn form() -> SubmissionForm {
        SubmissionForm {
            title: "  Rolex Submariner 116610LN ".to_string(),
            category: "watches".to_string(),
            description: "Full set with box and papers, serviced in 2023.".to_string(),
            starting_price: 9000,
            minimum_increment: None,
            end_time: Some(Utc::now() + Duration::days(7)),
            image_urls: vec!["u/d/1_0_front.jpg".to_string()],
            specifications: vec![
                SpecificationInput {
                    label: " Movement ".to_string(),
                    value: "Automatic".to_string(),
                },
                SpecificationInput {
                    label: "Case".to_string(),
                    value: "   ".to_string(),
                },
            ],
            certificates: vec![CertificateInput::default()],
            original_submission_id: None,
        }
    }

    #[test]
    fn valid_form_is_trimmed_and_defaults_increment() {
        let valid = form().validate(RULES, &[], Utc::now()).unwrap();
        assert_eq!(valid.title, "Rolex Submariner 116610LN");
        assert_eq!(valid.minimum_increment, 100);
        assert_eq!(
            valid.specifications,
            Some(vec![Specification {
                label: "Movement".to_string(),
                value: "Automatic".to_string()
            }])
        );
        assert_eq!(valid.certificates, None);
    }

    #[test]
    fn non_positive_increment_falls_back_to_default() {
        let mut f = form();
        f.minimum_increment = Some(0);
        assert_eq!(f.validate(RULES, &[], Utc::now()).unwrap().minimum_increment, 100);

        let mut f = form();
        f.minimum_increment = Some(250);
        assert_eq!(f.validate(RULES, &[], Utc::now()).unwrap().minimum_increment, 250);
    }

    #[test]
    fn every_problem_is_reported_together() {
        let f = SubmissionForm {
            title: "Ring".to_string(),
            description: "too short".to_string(),
            ..Default::default()
        };
        let err = f.validate(RULES, &[], Utc::now()).unwrap_err().to_string();
        assert!(err.contains("제목"));
        assert!(err.contains("카테고리"));
        assert!(err.contains("설명"));
        assert!(err.contains("시작 가격"));
        assert!(err.contains("종료 시각"));
        assert!(err.contains("이미지"));
    }

    #[test]
    fn editing_without_new_images_keeps_existing_ones() {
        let mut f = form();
        f.image_urls.clear();
        let existing = vec!["old/a.jpg".to_string(), "old/b.jpg".to_string()];
        let valid = f.validate(RULES, &existing, Utc::now()).unwrap();
        assert_eq!(valid.image_urls, existing);
    }

    #[test]
    fn more_than_ten_images_is_rejected() {
        let mut f = form();
        f.image_urls = (0..11).map(|i| format!("img{}.jpg", i)).collect();
        assert!(f.validate(RULES, &[], Utc::now()).is_err());
    }

    #[test]
    fn past_end_time_is_rejected() {
        let mut f = form();
        f.end_time = Some(Utc::now() - Duration::hours(1));
        assert!(f.validate(RULES, &[], Utc::now()).is_err());
    }

    #[test]
    fn resubmission_prefill_links_the_rejected_original() {
        use crate::auction::model::{ApprovalStatus, AuctionStatus};
        use sqlx::types::Json;

        let rejected = Auction {
            id: Uuid::new_v4(),
            title: "Tiffany Solitaire 1.2ct".to_string(),
            category: "diamonds".to_string(),
            description: "Platinum setting, GIA graded, VS1 clarity.".to_string(),
            starting_price: 12000,
            current_bid: 12000,
            minimum_increment: 500,
            status: AuctionStatus::Rejected,
            approval_status: ApprovalStatus::Rejected,
            image_urls: vec!["u/d/1_0_ring.jpg".to_string()],
            specifications: Some(Json(vec![Specification {
                label: "Carat".to_string(),
                value: "1.2".to_string(),
            }])),
            certificates: Some(Json(vec![Certificate {
                name: "GIA".to_string(),
                issuer: "GIA".to_string(),
                date: None,
            }])),
            end_time: Utc::now(),
            submitted_by: Uuid::new_v4(),
            original_submission_id: None,
            rejection_reason: Some("사진이 흐립니다".to_string()),
            approved_by: None,
            approved_at: None,
            admin_comparison_comments: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let prefill = SubmissionForm::resubmission_of(&rejected);
        assert_eq!(prefill.original_submission_id, Some(rejected.id));
        assert_eq!(prefill.minimum_increment, Some(500));
        assert_eq!(prefill.end_time, None);
        assert_eq!(prefill.specifications.len(), 1);
        assert_eq!(prefill.certificates[0].issuer, "GIA");
        assert_eq!(prefill.image_urls, rejected.image_urls);
    }
}
