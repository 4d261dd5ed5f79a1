//! 공통 유틸리티 모듈
//!
//! - [`validation`] - 이메일, 비밀번호, 이름 입력값 검증 규칙

pub mod validation;
