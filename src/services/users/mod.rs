//! 사용자 관리 서비스 모듈
//!
//! 가입, 로그인, 현재 사용자 조회, 비밀번호 변경, 계정 삭제를 담당합니다.

pub mod user_service;

pub use user_service::UserService;
