//! Signed, time-limited password reset tokens.
//!
//! Tokens are HS256 JWTs carrying the student id. Expiry and signature
//! failures surface as distinct errors so the caller can tell a stale link
//! from a forged one.

use crate::error::{AppError, AppResult};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const STUDENT_TOKEN_TYPE: &str = "student";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub typ: String,
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_reset_token(student_id: i64, secret: &str, ttl_secs: i64) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = ResetClaims {
        typ: STUDENT_TOKEN_TYPE.to_string(),
        sub: student_id,
        iat: now,
        exp: now + ttl_secs,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Returns the student id the token was issued for.
pub fn verify_reset_token(token: &str, secret: &str) -> AppResult<i64> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    })?;

    if data.claims.typ != STUDENT_TOKEN_TYPE {
        return Err(AppError::TokenInvalid);
    }
    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn roundtrip_returns_student_id() {
        let token = issue_reset_token(42, SECRET, 1800).expect("issue");
        assert_eq!(verify_reset_token(&token, SECRET).expect("verify"), 42);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let token = issue_reset_token(42, SECRET, -10).expect("issue");
        assert!(matches!(
            verify_reset_token(&token, SECRET),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue_reset_token(42, SECRET, 1800).expect("issue");
        assert!(matches!(
            verify_reset_token(&token, "other-secret"),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            verify_reset_token("abc.def.ghi", SECRET),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn other_token_types_are_invalid() {
        let now = chrono::Utc::now().timestamp();
        let claims = ResetClaims {
            typ: "admin".to_string(),
            sub: 1,
            iat: now,
            exp: now + 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encode");
        assert!(matches!(
            verify_reset_token(&token, SECRET),
            Err(AppError::TokenInvalid)
        ));
    }
}
