//! # 인메모리 Identity Store
//!
//! 테스트와 로컬 개발용 저장소 구현입니다.
//! 모든 테이블을 하나의 뮤텍스로 보호하므로 교체와 연쇄 삭제를 포함한 모든 연산이 원자적입니다.
//! 프로세스 하나에서만 유효하므로 여러 인스턴스를 띄우는 운영 환경에서는
//! [`MongoIdentityStore`](super::mongo_store::MongoIdentityStore)를 사용합니다.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::identity_store::{
    apply_oauth_update, normalize_provider, prepare_oauth_account, prepare_refresh_token,
    prepare_user, IdentityStore,
};
use crate::domain::entities::{
    NewOAuthAccount, NewRefreshToken, NewUser, OAuthAccount, RefreshToken, TokenState, User,
    UserChanges, UserStatus,
};
use crate::errors::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// token_hash → token
    refresh_tokens: HashMap<String, RefreshToken>,
    oauth_accounts: HashMap<Uuid, OAuthAccount>,
}

impl Tables {
    fn active_user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id).filter(|u| u.is_active())
    }

    fn active_user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.is_active() && u.email == email)
    }
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    tables: Mutex<Tables>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::StoreFailure("memory store lock poisoned".to_string()))
    }

    /// 삭제 여부와 관계없이 저장된 사용자를 조회합니다 (물리적 보존 확인용).
    pub fn raw_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    /// 사용자에게 남아 있는 리프레시 토큰 수
    pub fn refresh_token_count(&self, user_id: Uuid) -> AppResult<usize> {
        Ok(self
            .lock()?
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .count())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut tables = self.lock()?;

        if tables.active_user_by_email(&new_user.email).is_some() {
            return Err(AppError::DuplicateEmail(new_user.email));
        }

        let user = prepare_user(new_user, Utc::now());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<User> {
        self.lock()?
            .active_user_by_email(email)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user with email {}", email)))
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.lock()?
            .active_user(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self.lock()?.active_user_by_email(email).is_some())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut tables = self.lock()?;

        let user = tables
            .users
            .get_mut(&id)
            .filter(|u| u.is_active())
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

        changes.apply(user, Utc::now());
        Ok(user.clone())
    }

    async fn soft_delete_user(&self, id: Uuid) -> AppResult<()> {
        let mut tables = self.lock()?;
        let now = Utc::now();

        let user = tables
            .users
            .get_mut(&id)
            .filter(|u| u.is_active())
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

        user.status = UserStatus::Deleted { deleted_at: now };
        user.updated_at = now;

        tables.refresh_tokens.retain(|_, t| t.user_id != id);
        tables.oauth_accounts.retain(|_, a| a.user_id != id);
        Ok(())
    }

    async fn save_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let mut tables = self.lock()?;

        if tables.refresh_tokens.contains_key(&token.token_hash) {
            return Err(AppError::StoreFailure("duplicate refresh token hash".to_string()));
        }

        let token = prepare_refresh_token(token, Utc::now());
        tables.refresh_tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<(RefreshToken, User)> {
        let tables = self.lock()?;

        let token = tables
            .refresh_tokens
            .get(token_hash)
            .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;

        let owner = tables
            .active_user(token.user_id)
            .ok_or_else(|| AppError::NotFound("refresh token owner".to_string()))?;

        Ok((token.clone(), owner.clone()))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()> {
        let mut tables = self.lock()?;

        let token = tables
            .refresh_tokens
            .get_mut(token_hash)
            .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;

        token.revoked = true;
        Ok(())
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> AppResult<u64> {
        let mut tables = self.lock()?;

        let mut revoked = 0;
        for token in tables.refresh_tokens.values_mut() {
            if token.user_id == user_id && !token.revoked {
                token.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        replacement: NewRefreshToken,
    ) -> AppResult<RefreshToken> {
        let mut tables = self.lock()?;
        let now = Utc::now();

        if tables.refresh_tokens.contains_key(&replacement.token_hash) {
            return Err(AppError::StoreFailure("duplicate refresh token hash".to_string()));
        }

        let old = tables
            .refresh_tokens
            .get_mut(old_hash)
            .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;

        match old.state_at(now) {
            TokenState::Active => old.revoked = true,
            TokenState::Revoked => return Err(AppError::TokenRevoked),
            TokenState::Expired => return Err(AppError::TokenExpired),
        }

        let token = prepare_refresh_token(replacement, now);
        tables.refresh_tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn upsert_oauth_account(&self, account: NewOAuthAccount) -> AppResult<OAuthAccount> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let provider = normalize_provider(&account.provider);

        let existing = tables
            .oauth_accounts
            .values_mut()
            .find(|a| a.provider == provider && a.provider_user_id == account.provider_user_id);

        if let Some(existing) = existing {
            if existing.user_id != account.user_id {
                return Err(AppError::OAuthLinkConflict(format!(
                    "{}:{}",
                    provider, account.provider_user_id
                )));
            }
            apply_oauth_update(existing, account, now);
            return Ok(existing.clone());
        }

        let created = prepare_oauth_account(account, now);
        tables.oauth_accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_oauth_account(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<OAuthAccount> {
        let provider = normalize_provider(provider);

        self.lock()?
            .oauth_accounts
            .values()
            .find(|a| a.provider == provider && a.provider_user_id == provider_user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("oauth account {}:{}", provider, provider_user_id)))
    }

    async fn list_oauth_accounts(&self, user_id: Uuid) -> AppResult<Vec<OAuthAccount>> {
        let mut accounts: Vec<OAuthAccount> = self
            .lock()?
            .oauth_accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();

        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(accounts)
    }

    async fn delete_oauth_account(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        let mut tables = self.lock()?;
        let provider = normalize_provider(provider);

        let before = tables.oauth_accounts.len();
        tables
            .oauth_accounts
            .retain(|_, a| !(a.user_id == user_id && a.provider == provider));

        if tables.oauth_accounts.len() == before {
            return Err(AppError::NotFound(format!("oauth account {}", provider)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: "Test User".to_string(),
            role: None,
        }
    }

    fn new_token(user_id: Uuid, hash: &str, ttl: Duration) -> NewRefreshToken {
        NewRefreshToken {
            user_id,
            token_hash: hash.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    fn new_link(user_id: Uuid, provider: &str, access_token: &str) -> NewOAuthAccount {
        NewOAuthAccount {
            user_id,
            provider: provider.to_string(),
            provider_user_id: "g-42".to_string(),
            provider_email: Some("user@gmail.com".to_string()),
            access_token: access_token.to_string(),
            refresh_token: "provider-refresh".to_string(),
            expires_at: None,
        }
    }

    #[actix_web::test]
    async fn test_duplicate_email_is_rejected() {
        let store = MemoryIdentityStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        let err = store.create_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));

        assert!(store.create_user(new_user("b@example.com")).await.is_ok());
    }

    #[actix_web::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = MemoryIdentityStore::new();
        store.create_user(new_user("Mixed@Example.com")).await.unwrap();

        assert!(store.email_exists("Mixed@Example.com").await.unwrap());
        assert!(!store.email_exists("mixed@example.com").await.unwrap());
    }

    #[actix_web::test]
    async fn test_soft_delete_hides_user_and_cascades() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("gone@example.com")).await.unwrap();
        store
            .save_refresh_token(new_token(user.id, "h1", Duration::hours(1)))
            .await
            .unwrap();
        store.upsert_oauth_account(new_link(user.id, "google", "at")).await.unwrap();

        store.soft_delete_user(user.id).await.unwrap();

        assert!(matches!(store.find_user_by_id(user.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.find_user_by_email("gone@example.com").await,
            Err(AppError::NotFound(_))
        ));
        assert!(!store.email_exists("gone@example.com").await.unwrap());

        // 물리적으로는 보존
        let raw = store.raw_user(user.id).unwrap().unwrap();
        assert!(raw.is_deleted());
        assert!(raw.deleted_at().is_some());

        assert_eq!(store.refresh_token_count(user.id).unwrap(), 0);
        assert!(store.list_oauth_accounts(user.id).await.unwrap().is_empty());

        // 같은 이메일로 재가입 가능
        assert!(store.create_user(new_user("gone@example.com")).await.is_ok());
    }

    #[actix_web::test]
    async fn test_refresh_token_lookup_loads_owner() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("owner@example.com")).await.unwrap();
        store
            .save_refresh_token(new_token(user.id, "h1", Duration::hours(1)))
            .await
            .unwrap();

        let (token, owner) = store.find_refresh_token_by_hash("h1").await.unwrap();
        assert_eq!(token.user_id, user.id);
        assert_eq!(owner.id, user.id);
        assert!(!token.revoked);

        assert!(matches!(
            store.find_refresh_token_by_hash("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("r@example.com")).await.unwrap();
        store
            .save_refresh_token(new_token(user.id, "h1", Duration::hours(1)))
            .await
            .unwrap();

        store.revoke_refresh_token("h1").await.unwrap();
        store.revoke_refresh_token("h1").await.unwrap();

        let (token, _) = store.find_refresh_token_by_hash("h1").await.unwrap();
        assert!(token.revoked);

        assert!(matches!(
            store.revoke_refresh_token("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_revoke_all_only_touches_owner() {
        let store = MemoryIdentityStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        for hash in ["a1", "a2"] {
            store
                .save_refresh_token(new_token(alice.id, hash, Duration::hours(1)))
                .await
                .unwrap();
        }
        store
            .save_refresh_token(new_token(bob.id, "b1", Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(store.revoke_all_user_tokens(alice.id).await.unwrap(), 2);
        assert_eq!(store.revoke_all_user_tokens(alice.id).await.unwrap(), 0);

        let (bob_token, _) = store.find_refresh_token_by_hash("b1").await.unwrap();
        assert!(!bob_token.revoked);
    }

    #[actix_web::test]
    async fn test_rotation_succeeds_once() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("rot@example.com")).await.unwrap();
        store
            .save_refresh_token(new_token(user.id, "old", Duration::hours(1)))
            .await
            .unwrap();

        let rotated = store
            .rotate_refresh_token("old", new_token(user.id, "new-1", Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(rotated.token_hash, "new-1");

        let err = store
            .rotate_refresh_token("old", new_token(user.id, "new-2", Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenRevoked));
        assert!(matches!(
            store.find_refresh_token_by_hash("new-2").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_rotation_of_expired_token_fails() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("exp@example.com")).await.unwrap();
        store
            .save_refresh_token(new_token(user.id, "old", -Duration::seconds(1)))
            .await
            .unwrap();

        let err = store
            .rotate_refresh_token("old", new_token(user.id, "new", Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[actix_web::test]
    async fn test_oauth_upsert_updates_in_place() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("link@example.com")).await.unwrap();

        let first = store.upsert_oauth_account(new_link(user.id, "Google", "at-1")).await.unwrap();
        let mut update = new_link(user.id, "GOOGLE", "at-2");
        update.provider_email = None;
        let second = store.upsert_oauth_account(update).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.provider, "google");
        assert_eq!(second.access_token, "at-2");
        assert_eq!(second.provider_email.as_deref(), Some("user@gmail.com"));
        assert_eq!(store.list_oauth_accounts(user.id).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_oauth_link_owned_by_other_user_conflicts() {
        let store = MemoryIdentityStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();

        store.upsert_oauth_account(new_link(alice.id, "google", "at")).await.unwrap();
        let err = store.upsert_oauth_account(new_link(bob.id, "google", "at")).await.unwrap_err();
        assert!(matches!(err, AppError::OAuthLinkConflict(_)));
    }

    #[actix_web::test]
    async fn test_delete_oauth_account() {
        let store = MemoryIdentityStore::new();
        let user = store.create_user(new_user("unlink@example.com")).await.unwrap();
        store.upsert_oauth_account(new_link(user.id, "github", "at")).await.unwrap();

        store.delete_oauth_account(user.id, "GitHub").await.unwrap();
        assert!(matches!(
            store.find_oauth_account("github", "g-42").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_oauth_account(user.id, "github").await,
            Err(AppError::NotFound(_))
        ));
    }
}
