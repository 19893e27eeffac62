// region:    --- Imports
use crate::bidding::rules::BidRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

// endregion: --- Imports

// region:    --- App Error
/// 요청 처리 중 발생하는 오류
/// 응답 바디는 항상 {"error": 메시지, "code": 코드} 형태이다.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Bid(#[from] BidRejection),

    #[error("로그인이 필요합니다.")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("{service} 호출 실패: {message}")]
    External {
        service: &'static str,
        message: String,
    },

    #[error("데이터베이스 오류: {0}")]
    Database(sqlx::Error),

    #[error("내부 오류: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{}을(를) 찾을 수 없습니다.", resource))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(code: &'static str, msg: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: msg.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Bid(rejection) => rejection.code(),
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { code, .. } => code,
            AppError::External { .. } => "EXTERNAL_SERVICE_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Bid(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::External { .. } => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 요청 바디/경로/쿼리 해석 실패는 검증 오류
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Postgres 오류 코드를 요청 오류로 변환
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound("요청한 데이터를 찾을 수 없습니다.".to_string());
        }
        if let Some(db_err) = err.as_database_error() {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return AppError::conflict("DUPLICATE", "이미 존재하는 데이터입니다.")
                }
                Some("23503") => {
                    return AppError::validation("참조하는 데이터가 존재하지 않습니다.")
                }
                Some("42501") => return AppError::forbidden("권한이 없습니다."),
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                error!("{:<12} --> 데이터베이스 오류: {:?}", "Error", e);
                "데이터베이스 오류가 발생했습니다.".to_string()
            }
            AppError::Internal(e) => {
                error!("{:<12} --> 내부 오류: {}", "Error", e);
                "내부 오류가 발생했습니다.".to_string()
            }
            AppError::External { service, message } => {
                warn!("{:<12} --> {} 호출 실패: {}", "Error", service, message);
                format!("{} 서비스를 사용할 수 없습니다.", service)
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "error": message,
            "code": self.code(),
        });
        if let AppError::Bid(BidRejection::LowBid { minimum_bid, .. }) = &self {
            body["minimum_bid"] = serde_json::json!(minimum_bid);
        }

        (status, Json(body)).into_response()
    }
}

// endregion: --- App Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_bid_maps_to_bad_request_with_code() {
        let err = AppError::from(BidRejection::LowBid {
            amount: 900,
            minimum_bid: 1100,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "LOW_BID");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_keeps_its_code() {
        let err = AppError::conflict("CATEGORY_IN_USE", "사용 중");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CATEGORY_IN_USE");
    }
}
