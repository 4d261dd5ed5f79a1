//! 도메인 엔티티 모듈
//!
//! 저장소에 영구 저장되는 세 가지 레코드 종류를 정의합니다.
//!
//! - [`user`] - 사용자 (soft delete 상태 포함)
//! - [`refresh_token`] - 해시로 저장되는 리프레시 토큰
//! - [`oauth_account`] - 외부 OAuth 계정 연결

pub mod user;
pub mod refresh_token;
pub mod oauth_account;

pub use user::*;
pub use refresh_token::*;
pub use oauth_account::*;
