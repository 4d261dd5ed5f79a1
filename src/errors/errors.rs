//! 애플리케이션 전역에서 사용하는 에러 시스템
//!
//! 자격 증명 및 세션 코어를 위한 통합 에러 처리 시스템입니다.
//! `thiserror`와 `actix_web::ResponseError`를 사용하여 타입 안전하고
//! 일관된 에러 처리를 제공합니다.
//!
//! ## HTTP 응답 매핑
//!
//! | AppError | HTTP Status |
//! |----------|-------------|
//! | `ValidationError`, `InvalidRequest` | 400 Bad Request |
//! | `NotFound` | 404 Not Found |
//! | `DuplicateEmail`, `OAuthLinkConflict` | 409 Conflict |
//! | `InvalidCredentials`, `InvalidToken`, `TokenExpired`, `TokenRevoked`, `AuthenticationError` | 401 Unauthorized |
//! | `StoreFailure` | 503 Service Unavailable |
//! | 나머지 | 500 Internal Server Error |
//!
//! 세션 계층의 실패(`InvalidToken`/`TokenExpired`/`TokenRevoked`)는 토큰 상태를
//! 노출하지 않도록 경계에서 모두 같은 응답 본문으로 변환됩니다.

use thiserror::Error;
use crate::utils::validation::ValidationError;

/// 애플리케이션 전역 에러 타입
#[derive(Error, Debug)]
pub enum AppError {
    /// 입력값 검증 에러 (400 Bad Request)
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// 요청 본문 검증 에러 (400 Bad Request)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 이미 등록된 이메일 (409 Conflict)
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// 리소스 찾을 수 없음 (404 Not Found)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 이메일 또는 비밀번호 불일치 (401 Unauthorized)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 알 수 없는 리프레시 토큰
    #[error("Invalid token")]
    InvalidToken,

    /// 만료된 리프레시 토큰
    #[error("Token expired")]
    TokenExpired,

    /// 폐기된 리프레시 토큰
    #[error("Token revoked")]
    TokenRevoked,

    /// 다른 사용자에게 이미 연결된 OAuth 계정 (409 Conflict)
    #[error("OAuth account already linked: {0}")]
    OAuthLinkConflict(String),

    /// 액세스 토큰 인증 실패 (401 Unauthorized)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// 패스워드 해싱 실패 (500 Internal Server Error)
    #[error("Hashing failure: {0}")]
    HashingFailure(String),

    /// 저장소 인프라 실패 (503 Service Unavailable)
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// 내부 서버 에러 (500 Internal Server Error)
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 세션/자격 증명 계층의 인증 실패인지 확인합니다.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AppError::InvalidCredentials
                | AppError::InvalidToken
                | AppError::TokenExpired
                | AppError::TokenRevoked
                | AppError::AuthenticationError(_)
        )
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            AppError::ValidationError(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail(_) | AppError::OAuthLinkConflict(_) => StatusCode::CONFLICT,
            e if e.is_unauthenticated() => StatusCode::UNAUTHORIZED,
            AppError::StoreFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// HTTP 에러 응답을 생성합니다.
    ///
    /// 5xx 에러는 내부 정보를 숨기고 로그에만 상세 내용을 남깁니다.
    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();

        let message = if self.is_unauthenticated() {
            "unauthenticated".to_string()
        } else if status.is_server_error() {
            log::error!("요청 처리 실패: {}", self);
            match self {
                AppError::StoreFailure(_) => "service unavailable".to_string(),
                _ => "internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        actix_web::HttpResponse::build(status)
            .json(serde_json::json!({
                "error": message
            }))
    }
}

/// 검증 규칙에서 나온 필드 에러는 `ValidationError`로 복원하고,
/// 그 외 derive 검증 실패는 `InvalidRequest`로 변환합니다.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors.field_errors();

        for field in ["email", "password", "full_name"] {
            let restored = fields
                .get(field)
                .and_then(|errs| errs.first())
                .and_then(|e| ValidationError::from_code(field, &e.code));

            if let Some(kind) = restored {
                return AppError::ValidationError(kind);
            }
        }

        AppError::InvalidRequest(errors.to_string())
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 저장소 드라이버 에러를 `StoreFailure`로 변환하는 확장 trait
pub trait StoreContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn store_context(self, msg: &str) -> AppResult<T>;
}

impl<T, E> StoreContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn store_context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::StoreFailure(format!("{}: {}", msg, e)))
    }
}
