//! 인증 요청/응답 DTO
//!
//! 요청 DTO의 필드 검증은 `validator` derive를 사용하며,
//! 커스텀 검증 함수는 [`crate::utils::validation`]의 규칙을 그대로 사용합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::users::UserResponse;
use crate::domain::token::Session;
use crate::utils::validation;

fn into_field_error(e: validation::ValidationError) -> ValidationError {
    ValidationError::new(e.code()).with_message(e.to_string().into())
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    validation::validate_email(email).map(|_| ()).map_err(into_field_error)
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    validation::validate_password(password).map_err(into_field_error)
}

fn check_full_name(full_name: &str) -> Result<(), ValidationError> {
    validation::validate_full_name(full_name).map(|_| ()).map_err(into_field_error)
}

/// 회원가입 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "check_email"))]
    pub email: String,

    #[validate(custom(function = "check_password"))]
    pub password: String,

    #[validate(custom(function = "check_full_name"))]
    pub full_name: String,
}

/// 로컬 로그인 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "이메일을 입력해주세요"))]
    pub email: String,

    #[validate(length(min = 1, message = "비밀번호를 입력해주세요"))]
    pub password: String,
}

/// 토큰 갱신 / 로그아웃 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "리프레시 토큰이 필요합니다"))]
    pub refresh_token: String,
}

/// 세션 토큰 응답
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            refresh_expires_at: session.refresh_expires_at,
        }
    }
}

/// 로그인 응답
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub session: SessionResponse,
}
