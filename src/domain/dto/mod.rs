//! API 경계에서 사용하는 요청/응답 DTO

pub mod auth;
pub mod users;

pub use auth::*;
pub use users::*;
