//! JWT 액세스 토큰 서비스
//!
//! 세션 관리자는 [`AccessTokenIssuer`] trait을 통해서만 액세스 토큰을 발급하므로
//! 서명 방식은 이 모듈 안에서 교체할 수 있습니다. 기본 구현은 HS256입니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};

use crate::config::JwtConfig;
use crate::domain::entities::User;
use crate::domain::token::{AccessClaims, AccessToken};
use crate::errors::{AppError, AppResult};

/// 액세스 토큰 발급/검증 기능
pub trait AccessTokenIssuer: Send + Sync {
    /// 사용자에 대한 단기 액세스 토큰을 발급합니다.
    fn issue(&self, user: &User) -> AppResult<AccessToken>;

    /// 토큰을 검증하고 클레임을 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - 서명 불일치, 만료, 형식 오류
    fn verify(&self, token: &str) -> AppResult<AccessClaims>;
}

pub struct TokenService {
    secret: String,
    access_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, access_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
        }
    }

    /// `JWT_SECRET`, `JWT_ACCESS_EXPIRY` 환경 변수로 생성합니다.
    pub fn from_env() -> Self {
        Self::new(JwtConfig::secret(), JwtConfig::access_expiry())
    }

    /// `Authorization` 헤더에서 Bearer 토큰을 추출합니다.
    pub fn extract_bearer_token(auth_header: &str) -> AppResult<&str> {
        match auth_header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            _ => Err(AppError::AuthenticationError(
                "유효하지 않은 인증 헤더 형식입니다".to_string(),
            )),
        }
    }
}

impl AccessTokenIssuer for TokenService {
    fn issue(&self, user: &User) -> AppResult<AccessToken> {
        let now = Utc::now();
        let expiration = now + self.access_ttl;

        let claims = AccessClaims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        let token = encode(&Header::default(), &claims, &encoding_key)
            .map_err(|e| AppError::InternalError(format!("JWT 토큰 생성 실패: {}", e)))?;

        Ok(AccessToken {
            token,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn verify(&self, token: &str) -> AppResult<AccessClaims> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<AccessClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::AuthenticationError("토큰이 만료되었습니다".to_string())
                }
                _ => AppError::AuthenticationError(format!("유효하지 않은 토큰입니다: {}", e)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{UserRole, UserStatus};
    use uuid::Uuid;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "jwt@example.com".to_string(),
            password_hash: String::new(),
            full_name: "Jwt User".to_string(),
            role: UserRole::Admin,
            is_verified: false,
            created_at: now,
            updated_at: now,
            status: UserStatus::Active,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new("test-secret", Duration::minutes(15));
        let user = user();

        let token = service.issue(&user).unwrap();
        assert_eq!(token.expires_in, 900);

        let claims = service.verify(&token.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let issuer = TokenService::new("secret-a", Duration::minutes(15));
        let verifier = TokenService::new("secret-b", Duration::minutes(15));

        let token = issuer.issue(&user()).unwrap();
        assert!(matches!(
            verifier.verify(&token.token),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let service = TokenService::new("test-secret", Duration::seconds(-60));
        let token = service.issue(&user()).unwrap();
        assert!(matches!(
            service.verify(&token.token),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let service = TokenService::new("test-secret", Duration::minutes(15));
        assert!(service.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(TokenService::extract_bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert!(TokenService::extract_bearer_token("Basic abc").is_err());
        assert!(TokenService::extract_bearer_token("Bearer ").is_err());
    }
}
