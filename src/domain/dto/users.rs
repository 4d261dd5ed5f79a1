//! 사용자 계정 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{OAuthAccount, User};

/// 사용자 응답 DTO (비밀번호 해시와 삭제 상태 제외)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let User {
            id,
            email,
            full_name,
            role,
            is_verified,
            created_at,
            updated_at,
            ..
        } = user;

        Self {
            id: id.to_string(),
            email,
            full_name,
            role: role.as_str().to_string(),
            is_verified,
            created_at,
            updated_at,
        }
    }
}

/// 프로필 수정 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "이름을 입력해주세요"))]
    pub full_name: String,
}

/// 비밀번호 변경 요청
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "현재 비밀번호를 입력해주세요"))]
    pub current_password: String,
    pub new_password: String,
}

/// 연결된 OAuth 계정 응답 (프로바이더 토큰 제외)
#[derive(Debug, Clone, Serialize)]
pub struct OAuthAccountResponse {
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_token_expired: bool,
    pub needs_refresh: bool,
    pub created_at: DateTime<Utc>,
}

impl OAuthAccountResponse {
    pub fn from_account(account: OAuthAccount, now: DateTime<Utc>) -> Self {
        Self {
            is_token_expired: account.is_token_expired_at(now),
            needs_refresh: account.needs_refresh_at(now),
            provider: account.provider,
            provider_user_id: account.provider_user_id,
            provider_email: account.provider_email,
            expires_at: account.expires_at,
            created_at: account.created_at,
        }
    }
}
