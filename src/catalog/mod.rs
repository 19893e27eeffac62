/// 카테고리 관리
/// 1. 공개 목록 / 관리자 목록
/// 2. 생성, 수정, 삭제 (사용 중인 카테고리는 삭제 불가)
/// 3. 슬러그 -> 표시 이름 변환
// region:    --- Imports
use crate::auction::events::{ChangeEvent, ChangeKind, Table};
use crate::change_feed::{publish_or_warn, ChangePublisher};
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 카테고리 생성/수정 요청
/// 슬러그를 비워 두면 이름에서 만든다.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// 검증을 통과한 카테고리 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

/// 테이블이 비었을 때 쓰는 기본 카테고리 (이름, 슬러그)
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Watches", "watches"),
    ("Jewelry", "jewelry"),
    ("Diamonds", "diamonds"),
    ("Luxury Goods", "luxury-goods"),
];

// endregion: --- Model

// region:    --- Slug
/// 이름에서 슬러그 생성
/// 소문자로 바꾸고 영숫자 외 문자는 하이픈 하나로 묶는다.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// `^[a-z0-9-]+$`
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl CategoryForm {
    pub fn validate(self) -> AppResult<ValidCategory> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("카테고리 이름을 입력해 주세요."));
        }
        let slug = match self.slug.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => generate_slug(&name),
        };
        if slug.is_empty() {
            return Err(AppError::validation("슬러그를 입력해 주세요."));
        }
        if !is_valid_slug(&slug) {
            return Err(AppError::validation(
                "슬러그는 소문자, 숫자, 하이픈만 사용할 수 있습니다.",
            ));
        }
        Ok(ValidCategory {
            name,
            slug,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            display_order: self.display_order,
            is_active: self.is_active,
        })
    }
}

// endregion: --- Slug

// region:    --- Directory
/// 슬러그 -> 표시 이름
/// 모르는 슬러그는 그대로 돌려준다.
#[derive(Debug, Clone, Default)]
pub struct CategoryDirectory {
    names: HashMap<String, String>,
}

impl CategoryDirectory {
    pub fn new(categories: &[Category]) -> Self {
        Self {
            names: categories
                .iter()
                .map(|c| (c.slug.clone(), c.name.clone()))
                .collect(),
        }
    }

    /// 데이터베이스를 읽지 못했을 때 쓰는 기본 목록
    pub fn defaults() -> Self {
        Self {
            names: DEFAULT_CATEGORIES
                .iter()
                .map(|(name, slug)| (slug.to_string(), name.to_string()))
                .collect(),
        }
    }

    pub fn name_for<'a>(&'a self, slug: &'a str) -> &'a str {
        self.names.get(slug).map(String::as_str).unwrap_or(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.names.contains_key(slug)
    }
}

// endregion: --- Directory

// region:    --- Queries
const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, display_order, is_active, created_at, updated_at";

/// 활성 카테고리 목록
pub async fn list_active(db_manager: &DatabaseManager) -> AppResult<Vec<Category>> {
    info!("{:<12} --> 활성 카테고리 조회", "Catalog");
    let sql = format!(
        "SELECT {} FROM categories WHERE is_active = TRUE ORDER BY display_order, name",
        CATEGORY_COLUMNS
    );
    let categories = sqlx::query_as::<_, Category>(&sql)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(categories)
}

/// 전체 카테고리 목록 (관리자)
pub async fn list_all(db_manager: &DatabaseManager) -> AppResult<Vec<Category>> {
    info!("{:<12} --> 전체 카테고리 조회", "Catalog");
    let sql = format!(
        "SELECT {} FROM categories ORDER BY display_order, name",
        CATEGORY_COLUMNS
    );
    let categories = sqlx::query_as::<_, Category>(&sql)
        .fetch_all(db_manager.pool())
        .await?;
    Ok(categories)
}

/// 활성 카테고리 디렉터리
pub async fn directory(db_manager: &DatabaseManager) -> AppResult<CategoryDirectory> {
    let categories = list_active(db_manager).await?;
    if categories.is_empty() {
        return Ok(CategoryDirectory::defaults());
    }
    Ok(CategoryDirectory::new(&categories))
}

/// 카테고리 생성
pub async fn create_category(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    form: CategoryForm,
) -> AppResult<Category> {
    let valid = form.validate()?;
    info!("{:<12} --> 카테고리 생성 slug: {}", "Catalog", valid.slug);
    let sql = format!(
        "INSERT INTO categories (name, slug, description, display_order, is_active)
         VALUES ($1, $2, $3, $4, $5) RETURNING {}",
        CATEGORY_COLUMNS
    );
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(&valid.name)
        .bind(&valid.slug)
        .bind(&valid.description)
        .bind(valid.display_order)
        .bind(valid.is_active)
        .fetch_one(db_manager.pool())
        .await?;
    publish_category(publisher, ChangeKind::Insert, &category).await;
    Ok(category)
}

/// 카테고리 수정
/// 슬러그가 바뀌면 기존 경매의 카테고리도 함께 옮긴다.
pub async fn update_category(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    category_id: Uuid,
    form: CategoryForm,
) -> AppResult<Category> {
    let valid = form.validate()?;
    info!("{:<12} --> 카테고리 수정 id: {}", "Catalog", category_id);
    let sql = format!(
        "UPDATE categories
         SET name = $2, slug = $3, description = $4, display_order = $5, is_active = $6, updated_at = now()
         WHERE id = $1 RETURNING {}",
        CATEGORY_COLUMNS
    );
    let category = db_manager
        .transaction::<_, Category, AppError>(|tx| {
            Box::pin(async move {
                let previous_slug: Option<String> =
                    sqlx::query_scalar("SELECT slug FROM categories WHERE id = $1 FOR UPDATE")
                        .bind(category_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                let Some(previous_slug) = previous_slug else {
                    return Err(AppError::not_found("카테고리"));
                };

                let category = sqlx::query_as::<_, Category>(&sql)
                    .bind(category_id)
                    .bind(&valid.name)
                    .bind(&valid.slug)
                    .bind(&valid.description)
                    .bind(valid.display_order)
                    .bind(valid.is_active)
                    .fetch_one(&mut **tx)
                    .await?;

                if previous_slug != category.slug {
                    sqlx::query("UPDATE auctions SET category = $2 WHERE category = $1")
                        .bind(&previous_slug)
                        .bind(&category.slug)
                        .execute(&mut **tx)
                        .await?;
                }
                Ok(category)
            })
        })
        .await?;
    publish_category(publisher, ChangeKind::Update, &category).await;
    Ok(category)
}

/// 카테고리 삭제, 경매가 사용 중이면 거절
pub async fn delete_category(
    db_manager: &DatabaseManager,
    publisher: &dyn ChangePublisher,
    category_id: Uuid,
) -> AppResult<()> {
    info!("{:<12} --> 카테고리 삭제 id: {}", "Catalog", category_id);
    let category = db_manager
        .transaction::<_, Category, AppError>(|tx| {
            Box::pin(async move {
                let sql = format!(
                    "SELECT {} FROM categories WHERE id = $1 FOR UPDATE",
                    CATEGORY_COLUMNS
                );
                let category = sqlx::query_as::<_, Category>(&sql)
                    .bind(category_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or_else(|| AppError::not_found("카테고리"))?;

                let in_use: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM auctions WHERE category = $1")
                        .bind(&category.slug)
                        .fetch_one(&mut **tx)
                        .await?;
                if in_use > 0 {
                    return Err(AppError::conflict(
                        "CATEGORY_IN_USE",
                        format!(
                            "경매 {}건이 사용 중인 카테고리는 삭제할 수 없습니다.",
                            in_use
                        ),
                    ));
                }

                sqlx::query("DELETE FROM categories WHERE id = $1")
                    .bind(category_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(category)
            })
        })
        .await?;
    publish_category(publisher, ChangeKind::Delete, &category).await;
    Ok(())
}

async fn publish_category(publisher: &dyn ChangePublisher, kind: ChangeKind, category: &Category) {
    let payload = serde_json::json!({
        "id": category.id,
        "name": category.name,
        "slug": category.slug,
        "is_active": category.is_active,
    });
    publish_or_warn(
        publisher,
        ChangeEvent::new(Table::Categories, kind, category.id, payload),
    )
    .await;
}

// endregion: --- Queries
