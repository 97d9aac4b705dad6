//! JWT token creation and validation.
//!
//! Access and refresh tokens share one HS256 secret and one claim shape; they differ only
//! in lifetime. Validation checks signature and expiry and nothing else, so the caller
//! decides which kind of token it expected.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;

use super::types::Claims;

/// Lifetime of a bearer access token, in seconds.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Lifetime of the cookie-held refresh token, in seconds.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short machine-readable label used in error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::Malformed => "malformed",
            TokenError::Signing(_) => "signing",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// Issues and verifies tokens for a single shared secret.
///
/// Built once at startup and shared read-only between requests.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create a short-lived access token for a user.
    pub fn generate_access_token(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue(user_id, Utc::now(), ACCESS_TOKEN_TTL_SECS)
    }

    /// Create a long-lived refresh token for a user.
    pub fn generate_refresh_token(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue(user_id, Utc::now(), REFRESH_TOKEN_TTL_SECS)
    }

    /// Validate a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        // subject must be a numeric user id
        data.claims.user_id()?;
        Ok(data.claims)
    }

    fn issue(
        &self,
        user_id: i64,
        issued_at: DateTime<Utc>,
        ttl_secs: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(ttl_secs)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-testing-only";

    #[test]
    fn test_create_and_validate_access_token() {
        let service = TokenService::new(SECRET);
        let token = service
            .generate_access_token(42)
            .expect("should create token");

        let claims = service.validate_token(&token).expect("should validate token");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let service = TokenService::new(SECRET);
        let token = service
            .generate_refresh_token(7)
            .expect("should create token");

        let claims = service.validate_token(&token).expect("should validate token");
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECS);
        assert!(REFRESH_TOKEN_TTL_SECS > ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_subject_round_trips_for_many_ids() {
        let service = TokenService::new(SECRET);
        for user_id in [1_i64, 2, 999, i64::MAX] {
            let token = service.generate_access_token(user_id).unwrap();
            let claims = service.validate_token(&token).unwrap();
            assert_eq!(claims.user_id().unwrap(), user_id);
        }
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = TokenService::new(SECRET);
        let result = service.validate_token("invalid-token");
        assert!(matches!(result, Err(TokenError::Malformed)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = TokenService::new(SECRET);
        let token = service.generate_access_token(42).expect("should create token");

        let other = TokenService::new("wrong-secret");
        let result = other.validate_token(&token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(SECRET);
        let issued_at = Utc::now() - Duration::hours(1);
        let token = service
            .issue(42, issued_at, ACCESS_TOKEN_TTL_SECS)
            .expect("should create token");

        let result = service.validate_token(&token);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let service = TokenService::new(SECRET);
        let issued_at = Utc::now() - Duration::seconds(ACCESS_TOKEN_TTL_SECS - 30);
        let token = service
            .issue(42, issued_at, ACCESS_TOKEN_TTL_SECS)
            .expect("should create token");

        assert!(service.validate_token(&token).is_ok());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let service = TokenService::new(SECRET);
        let claims = Claims {
            sub: "someone@example.com".to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(TokenError::Malformed)
        ));
    }
}
