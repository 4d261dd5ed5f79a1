//! # 세션 관리 서비스
//!
//! 리프레시 토큰의 발급, 검증, 교체(rotation), 폐기를 담당합니다.
//!
//! ## 토큰 상태
//!
//! ```text
//! Active ──(시간 경과)──▶ Expired
//!    │
//!    └──(폐기/교체)────▶ Revoked
//! ```
//!
//! 두 종료 상태에서 다시 활성화되는 경로는 없습니다.
//! 리프레시 토큰 원문은 발급 시 호출자에게 한 번만 전달되고, 저장소에는 SHA-256 해시만 남습니다.
//! 갱신할 때마다 기존 토큰은 폐기되고 새 토큰이 발급되므로 하나의 리프레시 토큰은 한 번만 사용할 수 있습니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::domain::entities::{NewRefreshToken, RefreshToken, TokenState, User};
use crate::domain::token::Session;
use crate::errors::{AppError, AppResult};
use crate::repositories::IdentityStore;
use crate::services::auth::AccessTokenIssuer;

const REFRESH_SECRET_LENGTH: usize = 64;
const TOKEN_TYPE: &str = "Bearer";

/// 리프레시 토큰 비밀값 생성 (영숫자 64자)
fn generate_refresh_secret() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_SECRET_LENGTH)
        .map(char::from)
        .collect()
}

/// 저장용 리프레시 토큰 해시 (SHA-256 hex)
pub fn hash_refresh_token(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hash_prefix(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

pub struct SessionService {
    store: Arc<dyn IdentityStore>,
    issuer: Arc<dyn AccessTokenIssuer>,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        issuer: Arc<dyn AccessTokenIssuer>,
        config: SessionConfig,
    ) -> Self {
        Self { store, issuer, config }
    }

    /// 새 세션(액세스 토큰 + 리프레시 토큰)을 발급합니다.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let session = session_service.issue_session(&user).await?;
    /// // session.refresh_token 은 이 시점에만 원문으로 존재
    /// ```
    pub async fn issue_session(&self, user: &User) -> AppResult<Session> {
        let access = self.issuer.issue(user)?;
        let secret = generate_refresh_secret();
        let token_hash = hash_refresh_token(&secret);
        let expires_at = self.refresh_expiry()?;

        self.store
            .save_refresh_token(NewRefreshToken {
                user_id: user.id,
                token_hash,
                expires_at,
            })
            .await?;

        info!("🔑 세션 발급: user={}", user.id);

        Ok(Session {
            access_token: access.token,
            refresh_token: secret,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: access.expires_in,
            refresh_expires_at: expires_at,
        })
    }

    /// 리프레시 토큰으로 세션을 갱신합니다.
    ///
    /// 기존 토큰은 폐기되고 새 리프레시 토큰이 발급됩니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidToken` - 알 수 없는 토큰 (소유자가 삭제된 경우 포함)
    /// * `AppError::TokenRevoked` - 이미 폐기되었거나 다른 요청이 먼저 교체한 토큰
    /// * `AppError::TokenExpired` - 만료된 토큰
    pub async fn refresh_session(&self, presented: &str) -> AppResult<Session> {
        let old_hash = hash_refresh_token(presented);

        let (token, user) = match self.store.find_refresh_token_by_hash(&old_hash).await {
            Ok(found) => found,
            Err(AppError::NotFound(_)) => {
                warn!("알 수 없는 리프레시 토큰: {}…", hash_prefix(&old_hash));
                return Err(AppError::InvalidToken);
            }
            Err(e) => return Err(e),
        };

        match token.state_at(Utc::now()) {
            TokenState::Active => {}
            TokenState::Revoked => {
                warn!("폐기된 리프레시 토큰 사용 시도: user={}", user.id);
                return Err(AppError::TokenRevoked);
            }
            TokenState::Expired => {
                debug!("만료된 리프레시 토큰: user={}", user.id);
                return Err(AppError::TokenExpired);
            }
        }

        // 교체 이후에는 실패할 수 있는 단계가 없어야 함
        let access = self.issuer.issue(&user)?;
        let secret = generate_refresh_secret();
        let expires_at = self.refresh_expiry()?;

        let rotated = self
            .store
            .rotate_refresh_token(
                &old_hash,
                NewRefreshToken {
                    user_id: user.id,
                    token_hash: hash_refresh_token(&secret),
                    expires_at,
                },
            )
            .await;

        match rotated {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => return Err(AppError::InvalidToken),
            Err(e) => {
                if matches!(e, AppError::TokenRevoked) {
                    warn!("동시 갱신 요청에서 밀린 리프레시 토큰: user={}", user.id);
                }
                return Err(e);
            }
        }

        info!("🔄 세션 갱신: user={}", user.id);

        Ok(Session {
            access_token: access.token,
            refresh_token: secret,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: access.expires_in,
            refresh_expires_at: expires_at,
        })
    }

    /// 리프레시 토큰을 폐기합니다. 알 수 없는 토큰도 성공으로 처리합니다.
    pub async fn logout(&self, presented: &str) -> AppResult<()> {
        let token_hash = hash_refresh_token(presented);

        match self.store.revoke_refresh_token(&token_hash).await {
            Ok(()) => {
                info!("👋 로그아웃: {}…", hash_prefix(&token_hash));
                Ok(())
            }
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// 사용자의 모든 리프레시 토큰을 폐기합니다.
    pub async fn logout_all(&self, user_id: Uuid) -> AppResult<u64> {
        let revoked = self.store.revoke_all_user_tokens(user_id).await?;
        info!("👋 전체 로그아웃: user={} ({}개 폐기)", user_id, revoked);
        Ok(revoked)
    }

    fn refresh_expiry(&self) -> AppResult<DateTime<Utc>> {
        Utc::now()
            .checked_add_signed(self.config.refresh_ttl)
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "리프레시 토큰 수명이 범위를 벗어남: {}",
                    self.config.refresh_ttl
                ))
            })
    }

    /// 현재 시각 기준 토큰 상태
    pub fn token_state(&self, token: &RefreshToken) -> TokenState {
        token.state_at(Utc::now())
    }
}
