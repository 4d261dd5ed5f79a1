//! # Authentication Configuration Module
//!
//! JWT 액세스 토큰, 리프레시 토큰 수명 등 인증 관련 설정을 관리하는 모듈입니다.
//!
//! ## 필수 환경 변수 설정
//!
//! ```bash
//! export JWT_SECRET="your-super-secret-jwt-key"
//! export JWT_ACCESS_EXPIRY="15m"
//! export JWT_REFRESH_EXPIRY="168h"
//! ```
//!
//! 수명 값은 `s`, `m`, `h`, `d` 단위를 이어 붙인 형식(`1h30m`)을 지원합니다.

use std::env;
use chrono::Duration;

const DEFAULT_JWT_SECRET: &str = "default-secret-change-in-production";
const DEFAULT_ACCESS_EXPIRY: &str = "15m";
const DEFAULT_REFRESH_EXPIRY: &str = "168h";

/// JWT 토큰 설정
pub struct JwtConfig;

impl JwtConfig {
    /// JWT 서명 비밀키를 반환합니다.
    ///
    /// `JWT_SECRET`이 없으면 개발용 기본값을 사용하고 경고를 남깁니다.
    pub fn secret() -> String {
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                log::warn!("⚠️ JWT_SECRET 미설정 - 개발용 기본 비밀키 사용");
                DEFAULT_JWT_SECRET.to_string()
            }
        }
    }

    /// 액세스 토큰 수명 (`JWT_ACCESS_EXPIRY`, 기본값 15분)
    pub fn access_expiry() -> Duration {
        Self::duration_from_env("JWT_ACCESS_EXPIRY", DEFAULT_ACCESS_EXPIRY)
    }

    /// 리프레시 토큰 수명 (`JWT_REFRESH_EXPIRY`, 기본값 168시간)
    pub fn refresh_expiry() -> Duration {
        Self::duration_from_env("JWT_REFRESH_EXPIRY", DEFAULT_REFRESH_EXPIRY)
    }

    fn duration_from_env(key: &str, default: &str) -> Duration {
        let raw = env::var(key).unwrap_or_else(|_| default.to_string());
        parse_duration(&raw).unwrap_or_else(|e| {
            log::error!("{} 파싱 실패: {}. 기본값 {} 사용", key, e, default);
            // 기본값 상수는 항상 파싱 가능
            parse_duration(default).unwrap_or_else(|_| Duration::minutes(15))
        })
    }
}

/// 세션(리프레시 토큰) 발급 설정
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 리프레시 토큰 수명
    pub refresh_ttl: Duration,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            refresh_ttl: JwtConfig::refresh_expiry(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_ttl: Duration::hours(168),
        }
    }
}

/// `15m`, `168h`, `1h30m`, `7d`, `45s` 형식의 기간 문자열을 해석합니다.
///
/// # Errors
///
/// 빈 문자열, 단위 누락, 알 수 없는 단위, 0 이하의 기간, 표현 범위를 넘는 기간은 에러입니다.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("빈 기간 문자열".to_string());
    }

    let mut total = Duration::zero();
    let mut digits = String::new();

    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        if digits.is_empty() {
            return Err(format!("'{}' 앞에 숫자가 없습니다: {}", c, value));
        }
        let amount: i64 = digits
            .parse()
            .map_err(|_| format!("숫자가 너무 큽니다: {}", value))?;
        digits.clear();

        let part = match c {
            's' => Duration::try_seconds(amount),
            'm' => Duration::try_minutes(amount),
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            other => return Err(format!("알 수 없는 단위 '{}': {}", other, value)),
        };

        total = part
            .and_then(|part| total.checked_add(&part))
            .ok_or_else(|| format!("기간이 너무 깁니다: {}", value))?;
    }

    if !digits.is_empty() {
        return Err(format!("단위가 없습니다: {}", value));
    }

    if total <= Duration::zero() {
        return Err(format!("기간은 0보다 커야 합니다: {}", value));
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_durations() {
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("168h").unwrap(), Duration::hours(168));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
    }

    #[test]
    fn test_parse_compound_duration() {
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::hours(1) + Duration::minutes(30)
        );
    }

    #[test]
    fn test_parse_invalid_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("15").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("0m").is_err());
    }

    #[test]
    fn test_parse_overflowing_durations() {
        assert!(parse_duration("9999999999999d").is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
        assert!(parse_duration("106751991167d106751991167d").is_err());
        assert!(parse_duration("36500d").is_ok());
    }

    #[test]
    fn test_session_config_default() {
        assert_eq!(SessionConfig::default().refresh_ttl, Duration::hours(168));
    }
}
