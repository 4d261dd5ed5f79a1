//! # MongoDB Identity Store
//!
//! 운영 환경용 저장소 구현입니다. 세 개의 컬렉션을 사용합니다.
//!
//! | 컬렉션 | 인덱스 |
//! |--------|--------|
//! | `users` | `email` partial unique (`status == "active"`) |
//! | `refresh_tokens` | `token_hash` unique, `user_id` |
//! | `oauth_accounts` | `(provider, provider_user_id)` unique, `user_id` |
//!
//! 이메일 중복과 외부 계정 중복은 사전 조회가 아니라 인덱스 위반(E11000)으로 최종 판정합니다.
//!
//! 여러 문서를 함께 바꾸는 작업(사용자 삭제와 연쇄 정리, 리프레시 토큰 교체)은
//! 트랜잭션 안에서 실행되므로 레플리카 셋 구성이 필요합니다.
//! 토큰 교체는 트랜잭션 안에서도 조건부 업데이트를 유지하며,
//! `modified_count`가 1인 요청만 새 토큰을 저장할 수 있습니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::{
    bson::{self, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    ClientSession, Collection, IndexModel,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity_store::{
    normalize_provider, prepare_oauth_account, prepare_refresh_token, prepare_user, IdentityStore,
};
use crate::db::Database;
use crate::domain::entities::{
    NewOAuthAccount, NewRefreshToken, NewUser, OAuthAccount, RefreshToken, TokenState, User,
    UserChanges, UserRole, UserStatus,
};
use crate::errors::{AppError, AppResult, StoreContext};

const USERS: &str = "users";
const REFRESH_TOKENS: &str = "refresh_tokens";
const OAUTH_ACCOUNTS: &str = "oauth_accounts";

const STATUS_ACTIVE: &str = "active";
const STATUS_DELETED: &str = "deleted";

const DUPLICATE_KEY_CODE: i32 = 11000;
const WRITE_CONFLICT_CODE: i32 = 112;

fn server_error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::Command(e) => Some(e.code),
        _ => None,
    }
}

/// MongoDB 중복 키 에러(E11000)인지 확인합니다.
fn is_duplicate_key(err: &MongoError) -> bool {
    server_error_code(err) == Some(DUPLICATE_KEY_CODE)
}

/// 다른 트랜잭션이 같은 문서를 먼저 수정한 경우
fn is_write_conflict(err: &MongoError) -> bool {
    server_error_code(err) == Some(WRITE_CONFLICT_CODE)
}

fn to_bson_time(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_time(dt: bson::DateTime) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| AppError::StoreFailure(format!("timestamp out of range: {}", dt)))
}

fn parse_id(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).store_context("invalid stored id")
}

// ---------------------------------------------------------------------------
// 저장 문서
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    /// "active" | "deleted"
    pub status: String,
    pub deleted_at: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        let (status, deleted_at) = match user.status {
            UserStatus::Active => (STATUS_ACTIVE, None),
            UserStatus::Deleted { deleted_at } => (STATUS_DELETED, Some(to_bson_time(deleted_at))),
        };

        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            role: user.role.as_str().to_string(),
            is_verified: user.is_verified,
            status: status.to_string(),
            deleted_at,
            created_at: to_bson_time(user.created_at),
            updated_at: to_bson_time(user.updated_at),
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = AppError;

    fn try_from(doc: UserDocument) -> AppResult<Self> {
        let status = match (doc.status.as_str(), doc.deleted_at) {
            (STATUS_ACTIVE, _) => UserStatus::Active,
            (STATUS_DELETED, Some(deleted_at)) => UserStatus::Deleted {
                deleted_at: from_bson_time(deleted_at)?,
            },
            (STATUS_DELETED, None) => UserStatus::Deleted {
                deleted_at: from_bson_time(doc.updated_at)?,
            },
            (other, _) => {
                return Err(AppError::StoreFailure(format!("unknown user status: {}", other)));
            }
        };

        Ok(User {
            id: parse_id(&doc.id)?,
            email: doc.email,
            password_hash: doc.password_hash,
            full_name: doc.full_name,
            role: UserRole::from_str(&doc.role).map_err(AppError::StoreFailure)?,
            is_verified: doc.is_verified,
            created_at: from_bson_time(doc.created_at)?,
            updated_at: from_bson_time(doc.updated_at)?,
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: bson::DateTime,
    pub revoked: bool,
    pub created_at: bson::DateTime,
}

impl From<&RefreshToken> for RefreshTokenDocument {
    fn from(token: &RefreshToken) -> Self {
        Self {
            id: token.id.to_string(),
            user_id: token.user_id.to_string(),
            token_hash: token.token_hash.clone(),
            expires_at: to_bson_time(token.expires_at),
            revoked: token.revoked,
            created_at: to_bson_time(token.created_at),
        }
    }
}

impl TryFrom<RefreshTokenDocument> for RefreshToken {
    type Error = AppError;

    fn try_from(doc: RefreshTokenDocument) -> AppResult<Self> {
        Ok(RefreshToken {
            id: parse_id(&doc.id)?,
            user_id: parse_id(&doc.user_id)?,
            token_hash: doc.token_hash,
            expires_at: from_bson_time(doc.expires_at)?,
            revoked: doc.revoked,
            created_at: from_bson_time(doc.created_at)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthAccountDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub provider_user_id: String,
    pub provider_email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl From<&OAuthAccount> for OAuthAccountDocument {
    fn from(account: &OAuthAccount) -> Self {
        Self {
            id: account.id.to_string(),
            user_id: account.user_id.to_string(),
            provider: account.provider.clone(),
            provider_user_id: account.provider_user_id.clone(),
            provider_email: account.provider_email.clone(),
            access_token: account.access_token.clone(),
            refresh_token: account.refresh_token.clone(),
            expires_at: account.expires_at.map(to_bson_time),
            created_at: to_bson_time(account.created_at),
            updated_at: to_bson_time(account.updated_at),
        }
    }
}

impl TryFrom<OAuthAccountDocument> for OAuthAccount {
    type Error = AppError;

    fn try_from(doc: OAuthAccountDocument) -> AppResult<Self> {
        Ok(OAuthAccount {
            id: parse_id(&doc.id)?,
            user_id: parse_id(&doc.user_id)?,
            provider: doc.provider,
            provider_user_id: doc.provider_user_id,
            provider_email: doc.provider_email,
            access_token: doc.access_token,
            refresh_token: doc.refresh_token,
            expires_at: doc.expires_at.map(from_bson_time).transpose()?,
            created_at: from_bson_time(doc.created_at)?,
            updated_at: from_bson_time(doc.updated_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// 저장소
// ---------------------------------------------------------------------------

pub struct MongoIdentityStore {
    db: Arc<Database>,
}

impl MongoIdentityStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.get_database().collection(USERS)
    }

    fn refresh_tokens(&self) -> Collection<RefreshTokenDocument> {
        self.db.get_database().collection(REFRESH_TOKENS)
    }

    fn oauth_accounts(&self) -> Collection<OAuthAccountDocument> {
        self.db.get_database().collection(OAUTH_ACCOUNTS)
    }

    async fn begin_transaction(&self) -> AppResult<ClientSession> {
        let mut session = self
            .db
            .client()
            .start_session()
            .await
            .store_context("MongoDB 세션 시작 실패")?;
        session
            .start_transaction()
            .await
            .store_context("트랜잭션 시작 실패")?;
        Ok(session)
    }

    /// 결과가 `Ok`면 커밋하고, `Err`면 트랜잭션을 중단한 뒤 원래 에러를 돌려줍니다.
    async fn finish_transaction<T>(mut session: ClientSession, outcome: AppResult<T>) -> AppResult<T> {
        match outcome {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .store_context("트랜잭션 커밋 실패")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    warn!("⚠️ 트랜잭션 중단 실패: {}", abort);
                }
                Err(e)
            }
        }
    }

    /// 컬렉션 인덱스를 생성합니다. 서버 시작 시 한 번 호출합니다.
    ///
    /// 이미 존재하는 동일 인덱스는 MongoDB가 무시합니다.
    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "status": STATUS_ACTIVE })
                    .name("email_active_unique".to_string())
                    .build(),
            )
            .build();

        self.users()
            .create_indexes([email_index])
            .await
            .store_context("users 인덱스 생성 실패")?;

        let token_hash_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("token_hash_unique".to_string())
                    .build(),
            )
            .build();

        let token_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();

        self.refresh_tokens()
            .create_indexes([token_hash_index, token_user_index])
            .await
            .store_context("refresh_tokens 인덱스 생성 실패")?;

        let provider_index = IndexModel::builder()
            .keys(doc! { "provider": 1, "provider_user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("provider_account_unique".to_string())
                    .build(),
            )
            .build();

        let link_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();

        self.oauth_accounts()
            .create_indexes([provider_index, link_user_index])
            .await
            .store_context("oauth_accounts 인덱스 생성 실패")?;

        info!("✅ Identity store 인덱스 준비 완료");
        Ok(())
    }

    async fn find_active_user(&self, filter: bson::Document) -> AppResult<Option<User>> {
        let mut filter = filter;
        filter.insert("status", STATUS_ACTIVE);

        self.users()
            .find_one(filter)
            .await
            .store_context("사용자 조회 실패")?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl IdentityStore for MongoIdentityStore {
    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let user = prepare_user(new_user, Utc::now());

        match self.users().insert_one(UserDocument::from(&user)).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => Err(AppError::DuplicateEmail(user.email)),
            Err(e) => Err(AppError::StoreFailure(format!("사용자 생성 실패: {}", e))),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<User> {
        self.find_active_user(doc! { "email": email })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with email {}", email)))
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.find_active_user(doc! { "_id": id.to_string() })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count = self
            .users()
            .count_documents(doc! { "email": email, "status": STATUS_ACTIVE })
            .await
            .store_context("이메일 조회 실패")?;

        Ok(count > 0)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let now = Utc::now();

        let mut set = doc! { "updated_at": to_bson_time(now) };
        if let Some(full_name) = changes.full_name {
            set.insert("full_name", full_name);
        }
        if let Some(role) = changes.role {
            set.insert("role", role.as_str());
        }
        if let Some(is_verified) = changes.is_verified {
            set.insert("is_verified", is_verified);
        }
        if let Some(password_hash) = changes.password_hash {
            set.insert("password_hash", password_hash);
        }

        let updated = self
            .users()
            .find_one_and_update(
                doc! { "_id": id.to_string(), "status": STATUS_ACTIVE },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await
            .store_context("사용자 수정 실패")?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

        User::try_from(updated)
    }

    async fn soft_delete_user(&self, id: Uuid) -> AppResult<()> {
        let now = to_bson_time(Utc::now());
        let user_id = id.to_string();

        let mut session = self.begin_transaction().await?;
        let outcome = async {
            let result = self
                .users()
                .update_one(
                    doc! { "_id": user_id.as_str(), "status": STATUS_ACTIVE },
                    doc! { "$set": {
                        "status": STATUS_DELETED,
                        "deleted_at": now,
                        "updated_at": now,
                    }},
                )
                .session(&mut session)
                .await
                .store_context("사용자 삭제 실패")?;

            if result.matched_count == 0 {
                return Err(AppError::NotFound(format!("user {}", id)));
            }

            let tokens = self
                .refresh_tokens()
                .delete_many(doc! { "user_id": user_id.as_str() })
                .session(&mut session)
                .await
                .store_context("리프레시 토큰 삭제 실패")?;

            let links = self
                .oauth_accounts()
                .delete_many(doc! { "user_id": user_id.as_str() })
                .session(&mut session)
                .await
                .store_context("OAuth 연결 삭제 실패")?;

            Ok::<_, AppError>((tokens.deleted_count, links.deleted_count))
        }
        .await;

        let (tokens, links) = Self::finish_transaction(session, outcome).await?;

        info!(
            "🗑️ 사용자 삭제: {} (토큰 {}개, OAuth 연결 {}개 정리)",
            id, tokens, links
        );
        Ok(())
    }

    async fn save_refresh_token(&self, token: NewRefreshToken) -> AppResult<RefreshToken> {
        let token = prepare_refresh_token(token, Utc::now());

        self.refresh_tokens()
            .insert_one(RefreshTokenDocument::from(&token))
            .await
            .store_context("리프레시 토큰 저장 실패")?;

        Ok(token)
    }

    async fn find_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<(RefreshToken, User)> {
        let token = self
            .refresh_tokens()
            .find_one(doc! { "token_hash": token_hash })
            .await
            .store_context("리프레시 토큰 조회 실패")?
            .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;
        let token = RefreshToken::try_from(token)?;

        let owner = self
            .find_active_user(doc! { "_id": token.user_id.to_string() })
            .await?
            .ok_or_else(|| AppError::NotFound("refresh token owner".to_string()))?;

        Ok((token, owner))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> AppResult<()> {
        let result = self
            .refresh_tokens()
            .update_one(
                doc! { "token_hash": token_hash },
                doc! { "$set": { "revoked": true } },
            )
            .await
            .store_context("리프레시 토큰 폐기 실패")?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("refresh token".to_string()));
        }
        Ok(())
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> AppResult<u64> {
        let result = self
            .refresh_tokens()
            .update_many(
                doc! { "user_id": user_id.to_string(), "revoked": false },
                doc! { "$set": { "revoked": true } },
            )
            .await
            .store_context("리프레시 토큰 일괄 폐기 실패")?;

        Ok(result.modified_count)
    }

    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        replacement: NewRefreshToken,
    ) -> AppResult<RefreshToken> {
        let now = Utc::now();
        let token = prepare_refresh_token(replacement, now);

        let mut session = self.begin_transaction().await?;
        let outcome = async {
            let claimed = match self
                .refresh_tokens()
                .update_one(
                    doc! {
                        "token_hash": old_hash,
                        "revoked": false,
                        "expires_at": { "$gt": to_bson_time(now) },
                    },
                    doc! { "$set": { "revoked": true } },
                )
                .session(&mut session)
                .await
            {
                Ok(result) => result,
                Err(e) if is_write_conflict(&e) => return Err(AppError::TokenRevoked),
                Err(e) => return Err(AppError::StoreFailure(format!("리프레시 토큰 교체 실패: {}", e))),
            };

            if claimed.modified_count == 0 {
                // 조건에 맞지 않은 이유를 다시 조회해서 분류
                let current = self
                    .refresh_tokens()
                    .find_one(doc! { "token_hash": old_hash })
                    .session(&mut session)
                    .await
                    .store_context("리프레시 토큰 조회 실패")?
                    .ok_or_else(|| AppError::NotFound("refresh token".to_string()))?;

                return match RefreshToken::try_from(current)?.state_at(now) {
                    TokenState::Expired => Err(AppError::TokenExpired),
                    _ => Err(AppError::TokenRevoked),
                };
            }

            self.refresh_tokens()
                .insert_one(RefreshTokenDocument::from(&token))
                .session(&mut session)
                .await
                .store_context("리프레시 토큰 저장 실패")?;

            Ok::<_, AppError>(())
        }
        .await;

        Self::finish_transaction(session, outcome).await?;
        Ok(token)
    }

    async fn upsert_oauth_account(&self, account: NewOAuthAccount) -> AppResult<OAuthAccount> {
        let now = Utc::now();
        let fresh = prepare_oauth_account(account, now);
        let key = format!("{}:{}", fresh.provider, fresh.provider_user_id);

        let mut set = doc! {
            "access_token": fresh.access_token.as_str(),
            "refresh_token": fresh.refresh_token.as_str(),
            "expires_at": fresh.expires_at.map(to_bson_time),
            "updated_at": to_bson_time(now),
        };
        if let Some(email) = &fresh.provider_email {
            set.insert("provider_email", email.as_str());
        }

        let mut set_on_insert = doc! {
            "_id": fresh.id.to_string(),
            "created_at": to_bson_time(now),
        };
        if fresh.provider_email.is_none() {
            set_on_insert.insert("provider_email", bson::Bson::Null);
        }

        let result = self
            .oauth_accounts()
            .find_one_and_update(
                doc! {
                    "provider": fresh.provider.as_str(),
                    "provider_user_id": fresh.provider_user_id.as_str(),
                    "user_id": fresh.user_id.to_string(),
                },
                doc! { "$set": set, "$setOnInsert": set_on_insert },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(doc)) => OAuthAccount::try_from(doc),
            Ok(None) => Err(AppError::StoreFailure(format!("OAuth 연결 upsert 결과 없음: {}", key))),
            Err(e) if is_duplicate_key(&e) => Err(AppError::OAuthLinkConflict(key)),
            Err(e) => Err(AppError::StoreFailure(format!("OAuth 연결 저장 실패: {}", e))),
        }
    }

    async fn find_oauth_account(
        &self,
        provider: &str,
        provider_user_id: &str,
    ) -> AppResult<OAuthAccount> {
        let provider = normalize_provider(provider);

        let doc = self
            .oauth_accounts()
            .find_one(doc! { "provider": provider.as_str(), "provider_user_id": provider_user_id })
            .await
            .store_context("OAuth 연결 조회 실패")?
            .ok_or_else(|| {
                AppError::NotFound(format!("oauth account {}:{}", provider, provider_user_id))
            })?;

        OAuthAccount::try_from(doc)
    }

    async fn list_oauth_accounts(&self, user_id: Uuid) -> AppResult<Vec<OAuthAccount>> {
        let docs: Vec<OAuthAccountDocument> = self
            .oauth_accounts()
            .find(doc! { "user_id": user_id.to_string() })
            .sort(doc! { "created_at": 1 })
            .await
            .store_context("OAuth 연결 목록 조회 실패")?
            .try_collect()
            .await
            .store_context("OAuth 연결 목록 읽기 실패")?;

        docs.into_iter().map(OAuthAccount::try_from).collect()
    }

    async fn delete_oauth_account(&self, user_id: Uuid, provider: &str) -> AppResult<()> {
        let provider = normalize_provider(provider);

        let result = self
            .oauth_accounts()
            .delete_many(doc! { "user_id": user_id.to_string(), "provider": provider.as_str() })
            .await
            .store_context("OAuth 연결 삭제 실패")?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!("oauth account {}", provider)));
        }
        Ok(())
    }
}
