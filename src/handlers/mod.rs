//! # HTTP Request Handlers Module
//!
//! 서비스 계층을 감싸는 얇은 actix-web 핸들러입니다.
//! 핸들러는 요청 파싱, DTO 검증, 응답 변환만 담당하고 모든 규칙은 서비스가 판단합니다.
//!
//! ```text
//! Client ──▶ Handlers (이 모듈) ──▶ Services ──▶ IdentityStore
//! ```
//!
//! 공유 상태는 [`AppState`]를 `web::Data`로 주입받습니다.

use std::sync::Arc;

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;

use crate::config::SessionConfig;
use crate::db::Database;
use crate::domain::entities::User;
use crate::errors::{AppError, AppResult};
use crate::repositories::IdentityStore;
use crate::services::auth::{
    AccessTokenIssuer, OAuthLinkService, PasswordHasher, SessionService, TokenService,
};
use crate::services::users::UserService;

pub mod users;
pub mod auth;

/// 핸들러가 공유하는 서비스 묶음
pub struct AppState {
    pub users: Arc<UserService>,
    pub sessions: Arc<SessionService>,
    pub oauth_links: Arc<OAuthLinkService>,
    /// MongoDB 저장소를 사용할 때만 존재 (헬스 체크용)
    pub database: Option<Arc<Database>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
        issuer: Arc<dyn AccessTokenIssuer>,
        session_config: SessionConfig,
        database: Option<Arc<Database>>,
    ) -> Self {
        let sessions = Arc::new(SessionService::new(store.clone(), issuer.clone(), session_config));
        let users = Arc::new(UserService::new(store.clone(), hasher, sessions.clone(), issuer));
        let oauth_links = Arc::new(OAuthLinkService::new(store));

        Self {
            users,
            sessions,
            oauth_links,
            database,
        }
    }

    /// 환경 변수 설정(`BCRYPT_COST`, `JWT_*`)으로 서비스를 구성합니다.
    pub fn from_env(store: Arc<dyn IdentityStore>, database: Option<Arc<Database>>) -> Self {
        Self::new(
            store,
            PasswordHasher::from_env(),
            Arc::new(TokenService::from_env()),
            SessionConfig::from_env(),
            database,
        )
    }
}

/// `Authorization: Bearer ...` 헤더로 현재 사용자를 확인합니다.
pub(crate) async fn authenticated_user(req: &HttpRequest, state: &AppState) -> AppResult<User> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("인증 헤더가 없습니다".to_string()))?;

    let token = TokenService::extract_bearer_token(header)?;
    state.users.current_user(token).await
}
