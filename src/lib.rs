//! 인증 서비스 자격 증명 및 세션 코어
//!
//! 사용자 계정, 비밀번호 자격 증명, 리프레시 토큰 생명주기(발급, 검증, 교체, 폐기),
//! 외부 OAuth 계정 연결을 관리합니다.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← routes, handlers (actix-web)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← UserService, SessionService, OAuthLinkService
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  IdentityStore  │ ← MongoIdentityStore / MemoryIdentityStore
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auth_service_core::handlers::AppState;
//! use auth_service_core::repositories::MemoryIdentityStore;
//!
//! let state = AppState::from_env(Arc::new(MemoryIdentityStore::new()), None);
//! let user = state.users.register("user@example.com", "password123", "Jane Doe").await?;
//! let (_, session) = state.users.login("user@example.com", "password123").await?;
//! let renewed = state.users.refresh(&session.refresh_token).await?;
//! ```

pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;
