//! # Identity Store 계약
//!
//! 사용자, 리프레시 토큰, OAuth 계정 연결을 영구 저장하는 저장소 인터페이스입니다.
//! 서비스 계층은 구현체를 `Arc<dyn IdentityStore>`로 생성자에서 주입받습니다.
//!
//! ## 불변 조건
//!
//! - 이메일은 활성 사용자 사이에서 unique (저장소 제약이 최종 판정)
//! - 사용자 조회는 항상 soft-delete 된 사용자를 제외
//! - 사용자 삭제 시 해당 사용자의 리프레시 토큰과 OAuth 연결은 물리적으로 삭제
//! - `(provider, provider_user_id)` 쌍은 하나의 OAuth 연결에만 대응
//! - 리프레시 토큰 교체(폐기 + 신규 저장)는 하나의 원자적 단위
//!
//! ## 쓰기 경로 훅
//!
//! ID 생성, 기본 역할 부여, 프로바이더 이름 정규화는 엔티티가 아니라
//! 이 모듈의 `prepare_*` 함수에서 적용되며 모든 구현체가 공유합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    NewOAuthAccount, NewRefreshToken, NewUser, OAuthAccount, RefreshToken, User, UserChanges,
    UserStatus,
};
use crate::errors::AppResult;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// 사용자를 생성합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::DuplicateEmail` - 활성 사용자 중 같은 이메일이 존재
    /// * `AppError::StoreFailure` - 저장소 실패
    async fn create_user(&self, new_user: NewUser) -> AppResult<User>;

    /// 이메일로 활성 사용자를 조회합니다. 없으면 `NotFound`.
    async fn find_user_by_email(&self, email: &str) -> AppResult<User>;

    /// ID로 활성 사용자를 조회합니다. 없으면 `NotFound`.
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User>;

    /// 가입 전 중복 확인용 존재 여부 조회
    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// 활성 사용자의 프로필/역할/인증 여부/비밀번호 해시를 변경합니다.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// 사용자를 soft-delete 하고 리프레시 토큰과 OAuth 연결을 삭제합니다.
    async fn soft_delete_user(&self, id: Uuid) -> AppResult<()>;

    async fn save_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken>;

    /// 해시로 리프레시 토큰과 소유 사용자를 함께 조회합니다.
    ///
    /// 소유 사용자가 삭제된 경우에도 `NotFound`입니다.
    async fn find_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<(RefreshToken, User)>;

    /// 토큰을 폐기합니다. 이미 폐기된 토큰도 성공입니다. 없으면 `NotFound`.
    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()>;

    /// 사용자의 모든 토큰을 폐기하고 새로 폐기된 개수를 반환합니다.
    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> AppResult<u64>;

    /// 활성 상태인 기존 토큰을 폐기하고 새 토큰을 저장합니다.
    ///
    /// 기존 토큰이 더 이상 활성 상태가 아니면 아무것도 저장하지 않고
    /// `TokenRevoked` 또는 `TokenExpired`를 반환합니다. 동시에 같은 토큰으로
    /// 교체를 시도하면 정확히 하나만 성공합니다.
    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        replacement: NewRefreshToken,
    ) -> AppResult<RefreshToken>;

    /// `(provider, provider_user_id)` 기준으로 연결을 생성하거나 토큰/만료를 갱신합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::OAuthLinkConflict` - 같은 외부 계정이 다른 사용자에게 연결됨
    async fn upsert_oauth_account(&self, account: NewOAuthAccount) -> AppResult<OAuthAccount>;

    async fn find_oauth_account(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<OAuthAccount>;

    async fn list_oauth_accounts(&self, user_id: Uuid) -> AppResult<Vec<OAuthAccount>>;

    /// 사용자의 해당 프로바이더 연결을 삭제합니다. 없으면 `NotFound`.
    async fn delete_oauth_account(&self, user_id: Uuid, provider: &str) -> AppResult<()>;
}

/// 프로바이더 이름 정규화 (앞뒤 공백 제거 + 소문자)
pub fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}

/// 신규 사용자 쓰기 전 훅: 서버 측 UUID, 기본 역할, 타임스탬프, 활성 상태
pub fn prepare_user(new_user: NewUser, now: DateTime<Utc>) -> User {
    User {
        id: Uuid::new_v4(),
        email: new_user.email,
        password_hash: new_user.password_hash,
        full_name: new_user.full_name,
        role: new_user.role.unwrap_or_default(),
        is_verified: false,
        created_at: now,
        updated_at: now,
        status: UserStatus::Active,
    }
}

pub fn prepare_refresh_token(token: NewRefreshToken, now: DateTime<Utc>) -> RefreshToken {
    RefreshToken {
        id: Uuid::new_v4(),
        user_id: token.user_id,
        token_hash: token.token_hash,
        expires_at: token.expires_at,
        revoked: false,
        created_at: now,
    }
}

pub fn prepare_oauth_account(account: NewOAuthAccount, now: DateTime<Utc>) -> OAuthAccount {
    OAuthAccount {
        id: Uuid::new_v4(),
        user_id: account.user_id,
        provider: normalize_provider(&account.provider),
        provider_user_id: account.provider_user_id,
        provider_email: account.provider_email,
        access_token: account.access_token,
        refresh_token: account.refresh_token,
        expires_at: account.expires_at,
        created_at: now,
        updated_at: now,
    }
}

/// 기존 연결의 갱신 훅. 토큰과 만료는 교체하고, 프로바이더 이메일은 값이 있을 때만 교체합니다.
pub fn apply_oauth_update(existing: &mut OAuthAccount, update: NewOAuthAccount, now: DateTime<Utc>) {
    existing.provider = normalize_provider(&update.provider);
    existing.access_token = update.access_token;
    existing.refresh_token = update.refresh_token;
    existing.expires_at = update.expires_at;
    if update.provider_email.is_some() {
        existing.provider_email = update.provider_email;
    }
    existing.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;

    #[test]
    fn test_normalize_provider() {
        assert_eq!(normalize_provider("Google"), "google");
        assert_eq!(normalize_provider("  GitHub "), "github");
        assert_eq!(normalize_provider("kakao"), "kakao");
    }

    #[test]
    fn test_prepare_user_assigns_defaults() {
        let now = Utc::now();
        let user = prepare_user(
            NewUser {
                email: "user@example.com".to_string(),
                password_hash: "hash".to_string(),
                full_name: "Test User".to_string(),
                role: None,
            },
            now,
        );

        assert_eq!(user.role, UserRole::CarOwner);
        assert!(!user.is_verified);
        assert!(user.is_active());
        assert_eq!(user.created_at, now);
        assert_ne!(user.id, Uuid::nil());
    }

    #[test]
    fn test_prepare_oauth_account_lowercases_provider() {
        let account = prepare_oauth_account(
            NewOAuthAccount {
                user_id: Uuid::new_v4(),
                provider: "GOOGLE".to_string(),
                provider_user_id: "g-1".to_string(),
                provider_email: None,
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: None,
            },
            Utc::now(),
        );
        assert_eq!(account.provider, "google");
    }
}
