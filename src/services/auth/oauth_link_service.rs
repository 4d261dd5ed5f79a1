//! OAuth 계정 연결 서비스
//!
//! 외부 프로바이더와의 인증 교환은 다루지 않고, 교환 결과로 받은 토큰과 만료 정보를
//! 로컬 사용자에 연결해 저장하는 부분만 담당합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use uuid::Uuid;

use crate::domain::entities::{NewOAuthAccount, OAuthAccount};
use crate::errors::AppResult;
use crate::repositories::IdentityStore;

/// 계정 연결 요청
#[derive(Debug, Clone)]
pub struct LinkAccountRequest {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<LinkAccountRequest> for NewOAuthAccount {
    fn from(req: LinkAccountRequest) -> Self {
        Self {
            user_id: req.user_id,
            provider: req.provider,
            provider_user_id: req.provider_user_id,
            provider_email: req.provider_email,
            access_token: req.access_token,
            refresh_token: req.refresh_token,
            expires_at: req.expires_at,
        }
    }
}

pub struct OAuthLinkService {
    store: Arc<dyn IdentityStore>,
}

impl OAuthLinkService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// 외부 계정을 사용자에 연결합니다.
    ///
    /// 같은 `(provider, provider_user_id)` 연결이 이미 있으면 토큰과 만료 시각만 갱신합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::NotFound` - 사용자가 없거나 삭제됨
    /// * `AppError::OAuthLinkConflict` - 같은 외부 계정이 다른 사용자에게 연결됨
    pub async fn link_account(&self, request: LinkAccountRequest) -> AppResult<OAuthAccount> {
        self.store.find_user_by_id(request.user_id).await?;

        let account = self.store.upsert_oauth_account(request.into()).await?;
        info!(
            "🔗 OAuth 계정 연결: user={} provider={}",
            account.user_id, account.provider
        );
        Ok(account)
    }

    pub async fn unlink_account(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        self.store.delete_oauth_account(user_id, provider).await?;
        info!("OAuth 계정 연결 해제: user={} provider={}", user_id, provider);
        Ok(())
    }

    pub async fn linked_accounts(&self, user_id: Uuid) -> AppResult<Vec<OAuthAccount>> {
        self.store.list_oauth_accounts(user_id).await
    }

    pub fn is_token_expired(&self, account: &OAuthAccount) -> bool {
        account.is_token_expired_at(Utc::now())
    }

    /// 5분 이내 만료 예정이면 `true`
    pub fn needs_refresh(&self, account: &OAuthAccount) -> bool {
        account.needs_refresh_at(Utc::now())
    }
}
