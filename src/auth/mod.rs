/// 요청 사용자 식별
/// 인증은 앞단 게이트웨이가 처리하고, 검증된 사용자 id를 헤더로 넘겨 준다.
/// 여기서는 헤더의 id로 프로필과 권한을 읽는다.
// region:    --- Imports
use crate::error::{AppError, AppResult};
use crate::profiles::{self, Profile};
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;
use uuid::Uuid;

// endregion: --- Imports

/// 헤더에서 사용자 id 읽기
/// 헤더가 없으면 None, 형식이 잘못되었으면 Unauthorized
pub fn user_id_from_headers(headers: &HeaderMap, header_name: &str) -> AppResult<Option<Uuid>> {
    let Some(value) = headers.get(header_name) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AppError::Unauthorized)?;
    Uuid::parse_str(value.trim())
        .map(Some)
        .map_err(|_| AppError::Unauthorized)
}

async fn load_profile(parts: &Parts, state: &AppState) -> AppResult<Option<Profile>> {
    let Some(user_id) = user_id_from_headers(&parts.headers, &state.config.auth.user_header)? else {
        return Ok(None);
    };
    let profile = profiles::find_profile(&state.db, user_id).await?;
    if profile.is_none() {
        debug!("{:<12} --> 프로필 없는 사용자: {}", "Auth", user_id);
        return Err(AppError::Unauthorized);
    }
    Ok(profile)
}

// region:    --- Extractors
/// 로그인 사용자
pub struct CurrentUser(pub Profile);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        load_profile(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// 관리자
pub struct AdminUser(pub Profile);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(profile) = CurrentUser::from_request_parts(parts, state).await?;
        if !profile.is_admin() {
            return Err(AppError::forbidden("관리자만 접근할 수 있습니다."));
        }
        Ok(AdminUser(profile))
    }
}

/// 비로그인 허용
pub struct MaybeUser(pub Option<Profile>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(load_profile(parts, state).await?))
    }
}

// endregion: --- Extractors
