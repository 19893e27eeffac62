/// 재출품 비교
/// 거절된 원본과 재출품본을 나란히 놓고 바뀐 항목을 표시한다.
use super::model::Auction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    Title,
    Category,
    Description,
    StartingPrice,
    MinimumIncrement,
    ImageUrls,
    Specifications,
    Certificates,
}

/// 바뀐 항목 목록
pub fn changed_fields(original: &Auction, resubmitted: &Auction) -> Vec<ChangedField> {
    let checks = [
        (ChangedField::Title, original.title != resubmitted.title),
        (ChangedField::Category, original.category != resubmitted.category),
        (
            ChangedField::Description,
            original.description != resubmitted.description,
        ),
        (
            ChangedField::StartingPrice,
            original.starting_price != resubmitted.starting_price,
        ),
        (
            ChangedField::MinimumIncrement,
            original.minimum_increment != resubmitted.minimum_increment,
        ),
        (
            ChangedField::ImageUrls,
            original.image_urls != resubmitted.image_urls,
        ),
        (
            ChangedField::Specifications,
            original.specification_list() != resubmitted.specification_list(),
        ),
        (
            ChangedField::Certificates,
            original.certificate_list() != resubmitted.certificate_list(),
        ),
    ];
    checks
        .into_iter()
        .filter_map(|(field, changed)| changed.then_some(field))
        .collect()
}

/// 비교 화면 응답
#[derive(Debug, Clone, Serialize)]
pub struct ResubmissionComparison {
    pub original: Auction,
    pub resubmitted: Auction,
    pub changed_fields: Vec<ChangedField>,
    pub admin_comments: Option<String>,
}

impl ResubmissionComparison {
    pub fn new(original: Auction, resubmitted: Auction) -> Self {
        let changed_fields = changed_fields(&original, &resubmitted);
        let admin_comments = resubmitted.admin_comparison_comments.clone();
        Self {
            original,
            resubmitted,
            changed_fields,
            admin_comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{ApprovalStatus, AuctionStatus, Specification};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn auction() -> Auction {
        Auction {
            id: Uuid::new_v4(),
            title: "Cartier Tank Must".to_string(),
            category: "watches".to_string(),
            description: "Quartz, steel case, leather strap, 2021".to_string(),
            starting_price: 2500,
            current_bid: 2500,
            minimum_increment: 100,
            status: AuctionStatus::Rejected,
            approval_status: ApprovalStatus::Rejected,
            image_urls: vec!["a.jpg".to_string()],
            specifications: None,
            certificates: None,
            end_time: Utc::now(),
            submitted_by: Uuid::new_v4(),
            original_submission_id: None,
            rejection_reason: Some("photos unclear".to_string()),
            approved_by: None,
            approved_at: None,
            admin_comparison_comments: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn identical_listings_have_no_changes() {
        let original = auction();
        let mut again = original.clone();
        again.id = Uuid::new_v4();
        assert!(changed_fields(&original, &again).is_empty());
    }

    #[test]
    fn detects_price_images_and_specifications() {
        let original = auction();
        let mut again = original.clone();
        again.starting_price = 2200;
        again.image_urls.push("b.jpg".to_string());
        again.specifications = Some(Json(vec![Specification {
            label: "Case".to_string(),
            value: "Steel".to_string(),
        }]));
        assert_eq!(
            changed_fields(&original, &again),
            vec![
                ChangedField::StartingPrice,
                ChangedField::ImageUrls,
                ChangedField::Specifications
            ]
        );
    }

    #[test]
    fn empty_list_and_missing_list_are_the_same() {
        let original = auction();
        let mut again = original.clone();
        again.certificates = Some(Json(Vec::new()));
        assert!(changed_fields(&original, &again).is_empty());
    }
}
