//! # 입력값 검증 규칙
//!
//! 저장소에 쓰기 전에 실행되는 순수 검증 함수들입니다.
//! 각 검증은 서로 독립적이므로 호출 측에서 순서와 에러 집계 방식을 정합니다.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// 비밀번호 최소 길이 (문자 수)
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// 이름 최소 길이 (trim 후 문자 수)
pub const MIN_FULL_NAME_LENGTH: usize = 2;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// 검증 실패 종류
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 필수 필드가 비어 있음
    #[error("{0} is required")]
    RequiredFieldMissing(&'static str),

    /// 형식 불일치
    #[error("invalid {0} format")]
    InvalidFormat(&'static str),

    /// 비밀번호가 너무 짧음
    #[error("password must be at least 8 characters")]
    TooWeak,

    /// 최소 길이 미달
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },
}

impl ValidationError {
    /// `validator` 크레이트 에러 코드로 사용할 식별자
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::RequiredFieldMissing(_) => "required",
            ValidationError::InvalidFormat(_) => "invalid_format",
            ValidationError::TooWeak => "too_weak",
            ValidationError::TooShort { .. } => "too_short",
        }
    }

    /// 필드 이름과 [`code`](Self::code) 값으로 검증 실패 종류를 복원합니다.
    ///
    /// 이 모듈의 규칙이 만든 코드가 아니면 `None`을 반환합니다.
    pub fn from_code(field: &str, code: &str) -> Option<Self> {
        let field = match field {
            "email" => "email",
            "password" => "password",
            "full_name" => "full_name",
            _ => return None,
        };

        match (field, code) {
            (field, "required") => Some(ValidationError::RequiredFieldMissing(field)),
            (field, "invalid_format") => Some(ValidationError::InvalidFormat(field)),
            ("password", "too_weak") => Some(ValidationError::TooWeak),
            ("full_name", "too_short") => Some(ValidationError::TooShort {
                field,
                min: MIN_FULL_NAME_LENGTH,
            }),
            _ => None,
        }
    }
}

/// 이메일을 검증하고 앞뒤 공백을 제거한 값을 반환합니다.
///
/// # Errors
///
/// * `RequiredFieldMissing("email")` - trim 후 빈 문자열
/// * `InvalidFormat("email")` - `local@domain.tld` 형식이 아님
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::RequiredFieldMissing("email"));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(email.to_string())
}

/// 비밀번호를 검증합니다. 비밀번호는 trim 하지 않습니다.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::RequiredFieldMissing("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooWeak);
    }

    Ok(())
}

/// 이름을 검증하고 앞뒤 공백을 제거한 값을 반환합니다.
pub fn validate_full_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::RequiredFieldMissing("full_name"));
    }

    if name.chars().count() < MIN_FULL_NAME_LENGTH {
        return Err(ValidationError::TooShort {
            field: "full_name",
            min: MIN_FULL_NAME_LENGTH,
        });
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in [
            "user@example.com",
            "first.last+tag@sub.domain.org",
            "a_b%c-d@my-host.co.kr",
            "x@y.io",
        ] {
            assert_eq!(validate_email(email).unwrap(), email);
        }
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(validate_email("  user@example.com \n").unwrap(), "user@example.com");
    }

    #[test]
    fn test_empty_email_is_required() {
        assert_eq!(validate_email(""), Err(ValidationError::RequiredFieldMissing("email")));
        assert_eq!(validate_email("   "), Err(ValidationError::RequiredFieldMissing("email")));
    }

    #[test]
    fn test_malformed_emails() {
        for email in [
            "userexample.com",
            "user@localhost",
            "@example.com",
            "user@example.c",
            "user@example.c0m",
            "us er@example.com",
        ] {
            assert_eq!(
                validate_email(email),
                Err(ValidationError::InvalidFormat("email")),
                "{} should be rejected",
                email
            );
        }
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(validate_password(""), Err(ValidationError::RequiredFieldMissing("password")));
        assert_eq!(validate_password("a"), Err(ValidationError::TooWeak));
        assert_eq!(validate_password("1234567"), Err(ValidationError::TooWeak));
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("a much longer passphrase").is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 8 문자, 24 바이트
        assert!(validate_password("비밀번호비밀번호").is_ok());
        assert_eq!(validate_password("비밀번호"), Err(ValidationError::TooWeak));
    }

    #[test]
    fn test_full_name_rules() {
        assert_eq!(
            validate_full_name("  "),
            Err(ValidationError::RequiredFieldMissing("full_name"))
        );
        assert_eq!(
            validate_full_name(" J "),
            Err(ValidationError::TooShort { field: "full_name", min: 2 })
        );
        assert_eq!(validate_full_name("  Jo  ").unwrap(), "Jo");
        assert_eq!(validate_full_name("박장훈").unwrap(), "박장훈");
    }

    #[test]
    fn test_from_code_restores_kind() {
        for error in [
            validate_email("nope").unwrap_err(),
            validate_password("short").unwrap_err(),
            validate_full_name("J").unwrap_err(),
            validate_email(" ").unwrap_err(),
        ] {
            let field = match &error {
                ValidationError::RequiredFieldMissing(f) | ValidationError::InvalidFormat(f) => *f,
                ValidationError::TooWeak => "password",
                ValidationError::TooShort { field, .. } => *field,
            };
            assert_eq!(ValidationError::from_code(field, error.code()), Some(error));
        }

        assert_eq!(ValidationError::from_code("email", "length"), None);
        assert_eq!(ValidationError::from_code("refresh_token", "required"), None);
    }
}
