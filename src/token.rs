use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Fixed session lifetime: one hour from issuance.
pub const TOKEN_LIFETIME_SECS: i64 = 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signing/verification keys derived from the process-wide secret.
///
/// Verification is stateless: no store lookup happens, so a password change
/// does not invalidate tokens already issued. They stay valid until `exp`.
/// This is an accepted limitation of the design, not an oversight.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self::with_lifetime(secret, TOKEN_LIFETIME_SECS)
    }

    pub fn with_lifetime(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn issue(&self, user_id: i64, username: &str) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            iat: now,
            exp: now + self.lifetime_secs,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Checks signature, structure and expiry. No claim is read out of a
    /// token before this succeeds.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Forbidden("Invalid or expired token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_before_expiry() {
        let keys = TokenKeys::new("test-secret");
        let token = keys.issue(42, "alice").unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn expired_token_fails_verification() {
        let keys = TokenKeys::with_lifetime("test-secret", -120);
        let token = keys.issue(42, "alice").unwrap();

        assert!(matches!(
            keys.verify(&token),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::new("test-secret");
        let other = TokenKeys::new("another-secret");
        let token = other.issue(42, "alice").unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let keys = TokenKeys::new("test-secret");
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }
}
