/// 사용자 프로필
// region:    --- Imports
use crate::auction::model::UnknownStatus;
use crate::database::DatabaseManager;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl TryFrom<String> for Role {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(UnknownStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 이름 머리글자, 이름이 없으면 이메일 첫 글자
    pub fn initials(&self) -> Option<String> {
        let from_name: String = self
            .full_name
            .as_deref()
            .unwrap_or("")
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect::<String>()
            .to_uppercase();
        if !from_name.is_empty() {
            return Some(from_name);
        }
        self.email
            .as_deref()
            .and_then(|e| e.chars().next())
            .map(|c| c.to_uppercase().to_string())
    }
}

/// 프로필 수정 요청
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

// endregion: --- Model

// region:    --- Queries
const GET_PROFILE: &str =
    "SELECT id, email, full_name, phone, role, created_at, updated_at FROM profiles WHERE id = $1";

const UPDATE_PROFILE: &str = r#"
    UPDATE profiles SET full_name = $2, phone = $3, updated_at = now()
    WHERE id = $1
    RETURNING id, email, full_name, phone, role, created_at, updated_at
"#;

pub async fn find_profile(db_manager: &DatabaseManager, user_id: Uuid) -> AppResult<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(GET_PROFILE)
        .bind(user_id)
        .fetch_optional(db_manager.pool())
        .await?;
    Ok(profile)
}

/// 프로필 수정
/// 빈 문자열은 NULL로 저장한다.
pub async fn update_profile(
    db_manager: &DatabaseManager,
    user_id: Uuid,
    update: ProfileUpdate,
) -> AppResult<Profile> {
    info!("{:<12} --> 프로필 수정 user: {}", "Profile", user_id);
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    sqlx::query_as::<_, Profile>(UPDATE_PROFILE)
        .bind(user_id)
        .bind(clean(update.full_name))
        .bind(clean(update.phone))
        .fetch_optional(db_manager.pool())
        .await?
        .ok_or_else(|| AppError::not_found("프로필"))
}

// endregion: --- Queries
