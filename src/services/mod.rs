//! 비즈니스 로직을 담당하는 서비스 계층 모듈
//!
//! 모든 서비스는 저장소(`Arc<dyn IdentityStore>`)와 설정을 생성자로 주입받습니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::{users::UserService, auth::PasswordHasher};
//!
//! let user_service = UserService::new(store, PasswordHasher::from_env(), sessions, issuer);
//! let user = user_service.register("user@example.com", "password123", "Jane Doe").await?;
//! ```

pub mod users;
pub mod auth;
