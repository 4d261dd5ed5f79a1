//! # Domain Layer Module
//!
//! ```text
//! Domain Layer (이 모듈)
//! ├── entities  - 저장소에 영구 저장되는 레코드 (User, RefreshToken, OAuthAccount)
//! ├── token     - 액세스 토큰 클레임과 세션 토큰 쌍
//! └── dto       - HTTP 요청/응답 객체
//! ```
//!
//! 엔티티는 단순한 값이며 ID 생성 같은 쓰기 훅은 저장소 계층에서 적용됩니다.

pub mod entities;
pub mod token;
pub mod dto;
