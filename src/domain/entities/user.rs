//! User Entity Implementation
//!
//! 사용자 엔티티입니다. 생명주기 훅(ID 생성, 기본 역할 부여)은 엔티티가 아니라
//! 저장소의 쓰기 경로에서 적용되며, 엔티티는 단순한 값으로 유지됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// 기본 역할
    #[default]
    CarOwner,
    /// 관리자
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::CarOwner => "car_owner",
            UserRole::Admin => "admin",
        }
    }

    /// 저장된 문자열에서 역할을 복원합니다. 대소문자는 구분하지 않습니다.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "car_owner" => Ok(UserRole::CarOwner),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Unsupported role: {}", other)),
        }
    }
}

/// 계정 상태
///
/// 사용자는 물리적으로 삭제되지 않으며, 삭제 시 `Deleted`로 전환됩니다.
/// 모든 조회 경로는 이 상태를 명시적으로 확인해야 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Deleted { deleted_at: DateTime<Utc> },
}

/// 사용자 엔티티
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// 서버에서 생성한 고유 식별자
    pub id: Uuid,
    /// 이메일 (활성 사용자 사이에서 unique, 저장된 대소문자 그대로 비교)
    pub email: String,
    /// bcrypt 해시
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    /// 이메일 인증 여부
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: UserStatus,
}

impl User {
    pub fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }

    pub fn is_deleted(&self) -> bool {
        !self.is_active()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            UserStatus::Deleted { deleted_at } => Some(deleted_at),
            UserStatus::Active => None,
        }
    }
}

/// 신규 사용자 생성 입력
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    /// 없으면 기본 역할(`car_owner`)이 부여됩니다
    pub role: Option<UserRole>,
}

/// 사용자 정보 변경 입력. `None` 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub is_verified: Option<bool>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// 변경 사항을 사용자에 적용하고 `updated_at`을 갱신합니다.
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
        if let Some(password_hash) = self.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = now;
    }
}
