//! # 사용자 관리 서비스 구현
//!
//! HTTP 계층이 호출하는 계정 관련 연산을 제공합니다.
//!
//! ```text
//! register / login / refresh / logout / current_user
//!          │
//!          ▼
//! ┌──────────────┐   ┌────────────────┐   ┌────────────────┐
//! │  validation  │   │ PasswordHasher │   │ SessionService │
//! └──────────────┘   └────────────────┘   └────────────────┘
//!          │                                       │
//!          ▼                                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      IdentityStore                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 보안 설계
//!
//! - 로그인 실패는 이메일 미존재와 비밀번호 불일치를 구분하지 않습니다 (`InvalidCredentials`).
//! - 비밀번호 변경 시 사용자의 모든 리프레시 토큰을 폐기합니다.
//! - 액세스 토큰 검증 실패 사유는 외부에 노출하지 않습니다.

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::domain::entities::{NewUser, User, UserChanges};
use crate::domain::token::Session;
use crate::errors::{AppError, AppResult};
use crate::repositories::IdentityStore;
use crate::services::auth::{AccessTokenIssuer, PasswordHasher, SessionService};
use crate::utils::validation::{validate_email, validate_full_name, validate_password};

pub struct UserService {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    sessions: Arc<SessionService>,
    issuer: Arc<dyn AccessTokenIssuer>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
        sessions: Arc<SessionService>,
        issuer: Arc<dyn AccessTokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            issuer,
        }
    }

    /// 로컬 계정을 생성합니다.
    ///
    /// 검증은 이메일 → 비밀번호 → 이름 순으로 실행되며 첫 실패에서 중단합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 입력값 검증 실패
    /// * `AppError::DuplicateEmail` - 활성 사용자 중 같은 이메일 존재
    /// * `AppError::HashingFailure` - 비밀번호 해싱 실패
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> AppResult<User> {
        let email = validate_email(email)?;
        validate_password(password)?;
        let full_name = validate_full_name(full_name)?;

        if self.store.email_exists(&email).await? {
            return Err(AppError::DuplicateEmail(email));
        }

        let hash_start = std::time::Instant::now();
        let password_hash = self.hasher.hash(password)?;
        log::debug!("Password hashing took: {:?}", hash_start.elapsed());

        // 동시 가입은 저장소 unique 제약이 최종 판정
        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                full_name,
                role: None,
            })
            .await?;

        info!("👤 사용자 등록: {}", user.id);
        Ok(user)
    }

    /// 이메일/비밀번호로 로그인하고 새 세션을 발급합니다.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, Session)> {
        let user = match self.store.find_user_by_email(email.trim()).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                warn!("로그인 실패: 등록되지 않은 이메일");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!("로그인 실패: 비밀번호 불일치 user={}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let session = self.sessions.issue_session(&user).await?;
        info!("✅ 로그인: {}", user.id);
        Ok((user, session))
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        self.sessions.refresh_session(refresh_token).await
    }

    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        self.sessions.logout(refresh_token).await
    }

    /// 액세스 토큰의 소유 사용자를 조회합니다.
    ///
    /// 검증 실패, 잘못된 subject, 삭제된 사용자 모두 `AuthenticationError`입니다.
    pub async fn current_user(&self, access_token: &str) -> AppResult<User> {
        let claims = self.issuer.verify(access_token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthenticationError("unauthorized".to_string()))?;

        match self.store.find_user_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => {
                Err(AppError::AuthenticationError("unauthorized".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// 비밀번호를 변경하고 기존 세션을 모두 폐기합니다.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.store.find_user_by_id(user_id).await?;

        if !self.hasher.verify(current_password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        validate_password(new_password)?;
        let password_hash = self.hasher.hash(new_password)?;

        self.store
            .update_user(
                user_id,
                UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        self.sessions.logout_all(user_id).await?;
        info!("🔒 비밀번호 변경: {}", user_id);
        Ok(())
    }

    pub async fn mark_verified(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .update_user(
                user_id,
                UserChanges {
                    is_verified: Some(true),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn update_profile(&self, user_id: Uuid, full_name: &str) -> AppResult<User> {
        let full_name = validate_full_name(full_name)?;

        self.store
            .update_user(
                user_id,
                UserChanges {
                    full_name: Some(full_name),
                    ..Default::default()
                },
            )
            .await
    }

    /// 계정을 soft-delete 합니다. 리프레시 토큰과 OAuth 연결도 함께 삭제됩니다.
    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        self.store.soft_delete_user(user_id).await?;
        info!("🗑️ 계정 삭제: {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::domain::entities::UserRole;
    use crate::repositories::MemoryIdentityStore;
    use crate::services::auth::TokenService;
    use crate::utils::validation::ValidationError;
    use chrono::Duration;

    fn service() -> (Arc<MemoryIdentityStore>, UserService) {
        let store = Arc::new(MemoryIdentityStore::new());
        let issuer: Arc<dyn AccessTokenIssuer> =
            Arc::new(TokenService::new("user-test-secret", Duration::minutes(15)));
        let sessions = Arc::new(SessionService::new(
            store.clone(),
            issuer.clone(),
            SessionConfig::default(),
        ));
        let service = UserService::new(store.clone(), PasswordHasher::new(4), sessions, issuer);
        (store, service)
    }

    #[actix_web::test]
    async fn test_register_assigns_defaults() {
        let (_, service) = service();

        let user = service
            .register("  new@example.com ", "password123", " New User ")
            .await
            .unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.full_name, "New User");
        assert_eq!(user.role, UserRole::CarOwner);
        assert!(!user.is_verified);
        assert_ne!(user.password_hash, "password123");
    }

    #[actix_web::test]
    async fn test_register_duplicate_email() {
        let (_, service) = service();
        service.register("dup@example.com", "password123", "First").await.unwrap();

        let err = service
            .register("dup@example.com", "password456", "Second")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));

        assert!(service.register("other@example.com", "password123", "Other").await.is_ok());
    }

    #[actix_web::test]
    async fn test_register_validation_order() {
        let (_, service) = service();

        let err = service.register("bad-email", "short", "A").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ValidationError(ValidationError::InvalidFormat("email"))
        ));

        let err = service.register("ok@example.com", "short", "A").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(ValidationError::TooWeak)));

        let err = service.register("ok@example.com", "password123", "A").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ValidationError(ValidationError::TooShort { field: "full_name", .. })
        ));
    }

    #[actix_web::test]
    async fn test_login_success_and_failure() {
        let (_, service) = service();
        let user = service.register("login@example.com", "password123", "Login").await.unwrap();

        let (logged_in, session) = service.login("login@example.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(!session.refresh_token.is_empty());

        assert!(matches!(
            service.login("login@example.com", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "password123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[actix_web::test]
    async fn test_current_user() {
        let (_, service) = service();
        let user = service.register("me@example.com", "password123", "Me").await.unwrap();
        let (_, session) = service.login("me@example.com", "password123").await.unwrap();

        let me = service.current_user(&session.access_token).await.unwrap();
        assert_eq!(me.id, user.id);

        assert!(matches!(
            service.current_user("garbage").await,
            Err(AppError::AuthenticationError(_))
        ));

        service.delete_account(user.id).await.unwrap();
        assert!(matches!(
            service.current_user(&session.access_token).await,
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[actix_web::test]
    async fn test_refresh_and_logout_delegate_to_sessions() {
        let (_, service) = service();
        service.register("flow@example.com", "password123", "Flow").await.unwrap();
        let (_, session) = service.login("flow@example.com", "password123").await.unwrap();

        let renewed = service.refresh(&session.refresh_token).await.unwrap();
        service.logout(&renewed.refresh_token).await.unwrap();

        assert!(matches!(
            service.refresh(&renewed.refresh_token).await,
            Err(AppError::TokenRevoked)
        ));
        assert!(service.logout("unknown").await.is_ok());
    }

    #[actix_web::test]
    async fn test_change_password_revokes_sessions() {
        let (_, service) = service();
        let user = service.register("pw@example.com", "password123", "Pw").await.unwrap();
        let (_, session) = service.login("pw@example.com", "password123").await.unwrap();

        assert!(matches!(
            service.change_password(user.id, "not-current", "newpassword1").await,
            Err(AppError::InvalidCredentials)
        ));

        service
            .change_password(user.id, "password123", "newpassword1")
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(&session.refresh_token).await,
            Err(AppError::TokenRevoked)
        ));
        assert!(service.login("pw@example.com", "newpassword1").await.is_ok());
        assert!(matches!(
            service.login("pw@example.com", "password123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[actix_web::test]
    async fn test_profile_updates() {
        let (_, service) = service();
        let user = service.register("p@example.com", "password123", "Before").await.unwrap();

        let verified = service.mark_verified(user.id).await.unwrap();
        assert!(verified.is_verified);

        let renamed = service.update_profile(user.id, "After").await.unwrap();
        assert_eq!(renamed.full_name, "After");
        assert!(renamed.is_verified);

        assert!(service.update_profile(user.id, " ").await.is_err());
    }

    #[actix_web::test]
    async fn test_delete_account_frees_email() {
        let (store, service) = service();
        let user = service.register("bye@example.com", "password123", "Bye").await.unwrap();
        service.login("bye@example.com", "password123").await.unwrap();

        service.delete_account(user.id).await.unwrap();

        assert_eq!(store.refresh_token_count(user.id).unwrap(), 0);
        assert!(matches!(
            service.login("bye@example.com", "password123").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(service.register("bye@example.com", "password123", "Again").await.is_ok());
    }
}
