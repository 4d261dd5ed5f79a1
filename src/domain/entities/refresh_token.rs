//! Refresh Token Entity
//!
//! 리프레시 토큰은 원문이 아닌 SHA-256 해시로만 저장됩니다.
//! 유효성은 저장된 값이 아니라 `revoked`와 `expires_at`에서 매번 계산됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 리프레시 토큰 상태
///
/// `Active` → `Expired` (시간 경과) 또는 `Revoked` (명시적 폐기).
/// 두 종료 상태에서 다시 활성화되는 전이는 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    /// 소유 사용자
    pub user_id: Uuid,
    /// 토큰 비밀값의 SHA-256 hex
    #[serde(skip_serializing, default)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// 주어진 시각 기준 상태. 폐기와 만료가 동시에 해당하면 `Revoked`입니다.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked {
            TokenState::Revoked
        } else if now < self.expires_at {
            TokenState::Active
        } else {
            TokenState::Expired
        }
    }
}

/// 리프레시 토큰 저장 입력
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expires_at: DateTime<Utc>, revoked: bool) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            expires_at,
            revoked,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_before_expiry() {
        let now = Utc::now();
        let t = token(now + Duration::hours(1), false);
        assert_eq!(t.state_at(now), TokenState::Active);
        assert_eq!(t.state_at(now + Duration::minutes(59)), TokenState::Active);
    }

    #[test]
    fn test_expired_at_and_after_expiry() {
        let now = Utc::now();
        let t = token(now, false);
        // 만료 시각과 같으면 이미 만료
        assert_eq!(t.state_at(now), TokenState::Expired);
        assert_eq!(t.state_at(now + Duration::seconds(1)), TokenState::Expired);
    }

    #[test]
    fn test_revoked_wins_over_expiry() {
        let now = Utc::now();
        assert_eq!(token(now + Duration::hours(1), true).state_at(now), TokenState::Revoked);
        assert_eq!(token(now - Duration::hours(1), true).state_at(now), TokenState::Revoked);
    }
}
