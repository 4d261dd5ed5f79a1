//! 인증 및 보안 서비스 모듈
//!
//! 자격 증명 해싱, 액세스 토큰 발급, 리프레시 세션, OAuth 계정 연결을 담당합니다.
//!
//! # Features
//!
//! - bcrypt 비밀번호 해싱 ([`PasswordHasher`])
//! - HS256 액세스 토큰 발급/검증 ([`TokenService`], [`AccessTokenIssuer`])
//! - 리프레시 토큰 발급, 교체, 폐기 ([`SessionService`])
//! - OAuth 계정 연결과 토큰 만료 추적 ([`OAuthLinkService`])
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crate::services::auth::{SessionService, TokenService};
//!
//! let issuer = Arc::new(TokenService::from_env());
//! let sessions = SessionService::new(store.clone(), issuer, SessionConfig::from_env());
//! let session = sessions.issue_session(&user).await?;
//! ```

pub mod password_service;
pub mod token_service;
pub mod session_service;
pub mod oauth_link_service;

pub use password_service::*;
pub use token_service::*;
pub use session_service::*;
pub use oauth_link_service::*;
