//! JWT 액세스 토큰 클레임과 세션 토큰 쌍
//!
//! 액세스 토큰은 외부 발급 기능(`AccessTokenIssuer`)이 만들며,
//! 세션은 액세스 토큰과 1회용 리프레시 토큰 원문을 묶어 호출자에게 한 번만 전달됩니다.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::UserRole;

/// 액세스 토큰 클레임
///
/// - `sub`: 사용자 ID (UUID 문자열)
/// - `role`: 사용자 역할
/// - `iat` / `exp`: 발급/만료 시각 (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// 발급된 액세스 토큰
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// 로그인/갱신 결과로 전달되는 토큰 쌍
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    /// 리프레시 토큰 원문. 저장소에는 해시만 남습니다.
    pub refresh_token: String,
    pub token_type: String,
    /// 액세스 토큰 만료까지 남은 시간 (초)
    pub expires_in: i64,
    pub refresh_expires_at: DateTime<Utc>,
}
