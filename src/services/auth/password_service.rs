//! 비밀번호 해싱 서비스
//!
//! bcrypt 기반의 단방향 해시를 생성하고 검증합니다.
//! 해시마다 새 salt가 생성되므로 같은 비밀번호라도 결과 문자열은 매번 다릅니다.
//!
//! bcrypt 입력 한도(72바이트)를 넘는 비밀번호는 잘라서 해싱하지 않고 거부합니다.

use crate::config::PasswordConfig;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// `BCRYPT_COST` 환경 변수의 cost를 사용합니다 (기본값 10).
    pub fn from_env() -> Self {
        Self::new(PasswordConfig::bcrypt_cost())
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// 평문 비밀번호를 해싱합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::HashingFailure` - cost가 허용 범위를 벗어났거나 비밀번호가 72바이트를 넘는 경우
    pub fn hash(&self, password: &str) -> AppResult<String> {
        bcrypt::non_truncating_hash(password, self.cost)
            .map_err(|e| AppError::HashingFailure(format!("비밀번호 해싱 실패: {}", e)))
    }

    /// 평문과 저장된 해시를 비교합니다.
    ///
    /// 해시 형식이 잘못되었거나 비밀번호가 72바이트를 넘으면 에러 대신 `false`를 반환합니다.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        match bcrypt::non_truncating_verify(password, password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("저장된 비밀번호 해시 검증 불가: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::DEFAULT_COST)
    }
}
