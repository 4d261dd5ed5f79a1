//! OAuth Account Link Entity
//!
//! 로컬 사용자와 외부 OAuth 프로바이더 계정의 연결 정보입니다.
//! 프로바이더 이름은 생성과 갱신 모두에서 소문자로 정규화되어 저장됩니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 토큰 사전 갱신 구간 (5분)
pub const REFRESH_LOOKAHEAD_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    /// 소문자 프로바이더 이름 (예: "google")
    pub provider: String,
    /// 프로바이더 측 사용자 ID
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    #[serde(skip_serializing, default)]
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthAccount {
    /// 만료 시각이 설정되어 있고 `now`보다 엄격히 과거이면 만료입니다.
    pub fn is_token_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    /// 만료 시각이 `now + 5분` 이전이면 갱신이 필요합니다.
    ///
    /// 만료보다 먼저 참이 되므로 호출 측이 미리 토큰을 갱신할 수 있습니다.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::minutes(REFRESH_LOOKAHEAD_MINUTES) > expires_at,
            None => false,
        }
    }
}

/// OAuth 계정 연결 입력
#[derive(Debug, Clone)]
pub struct NewOAuthAccount {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(expires_at: Option<DateTime<Utc>>) -> OAuthAccount {
        let now = Utc::now();
        OAuthAccount {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: "google".to_string(),
            provider_user_id: "g-123".to_string(),
            provider_email: None,
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_within_lookahead_needs_refresh_but_not_expired() {
        let now = Utc::now();
        let link = account(Some(now + Duration::minutes(3)));
        assert!(link.needs_refresh_at(now));
        assert!(!link.is_token_expired_at(now));
    }

    #[test]
    fn test_past_expiry_is_expired_and_needs_refresh() {
        let now = Utc::now();
        let link = account(Some(now - Duration::seconds(1)));
        assert!(link.needs_refresh_at(now));
        assert!(link.is_token_expired_at(now));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let link = account(None);
        assert!(!link.needs_refresh_at(Utc::now()));
        assert!(!link.is_token_expired_at(Utc::now()));
    }

    #[test]
    fn test_far_expiry_is_fresh() {
        let now = Utc::now();
        let link = account(Some(now + Duration::hours(1)));
        assert!(!link.needs_refresh_at(now));
        assert!(!link.is_token_expired_at(now));
    }

    #[test]
    fn test_exact_expiry_instant_is_not_yet_expired() {
        let now = Utc::now();
        let link = account(Some(now));
        assert!(!link.is_token_expired_at(now));
        assert!(link.needs_refresh_at(now));
    }

    #[test]
    fn test_tokens_are_not_serialized() {
        let json = serde_json::to_value(account(None)).unwrap();
        assert!(json.get("access_token").is_none());
        assert!(json.get("refresh_token").is_none());
        assert_eq!(json["provider"], "google");
    }
}
