//! Access/refresh token signing and verification.
//!
//! The two token classes use independent secrets, so compromise of one
//! does not compromise the other and a token of one class never verifies
//! as the other. Verification failures are reported uniformly — callers
//! must not be able to tell a bad signature from an expired token.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::model::Claims;
use crate::service::{AuthConfig, AuthError, AuthService};
use crate::util::new_id;

/// Holds the signing/verification keys for both token classes.
pub(crate) struct TokenKeys {
    access_enc: EncodingKey,
    access_dec: DecodingKey,
    refresh_enc: EncodingKey,
    refresh_dec: DecodingKey,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(AuthError::Internal(
                "token signing secrets must not be empty".to_string(),
            ));
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::Internal(
                "access and refresh token secrets must be distinct".to_string(),
            ));
        }
        Ok(Self {
            access_enc: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_dec: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_enc: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_dec: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        })
    }

    /// Sign a short-lived access token for `user_id`.
    pub fn sign_access(&self, user_id: &str) -> Result<String, AuthError> {
        sign(user_id, self.access_ttl, &self.access_enc)
    }

    /// Sign a refresh token for `user_id`.
    pub fn sign_refresh(&self, user_id: &str) -> Result<String, AuthError> {
        sign(user_id, self.refresh_ttl, &self.refresh_enc)
    }

    /// Verify an access token, returning the subject user id.
    pub fn verify_access(&self, token: &str) -> Result<String, AuthError> {
        verify(token, &self.access_dec)
    }

    /// Verify a refresh token, returning the subject user id.
    pub fn verify_refresh(&self, token: &str) -> Result<String, AuthError> {
        verify(token, &self.refresh_dec)
    }
}

fn sign(user_id: &str, ttl: i64, key: &EncodingKey) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        jti: new_id(),
        iat: now,
        exp: now + ttl,
    };
    encode(&Header::default(), &claims, key).map_err(|e| {
        tracing::error!(error = %e, "JWT encode failed");
        AuthError::Internal("failed to sign token".to_string())
    })
}

fn verify(token: &str, key: &DecodingKey) -> Result<String, AuthError> {
    // Signature mismatch, malformed input, and expiry all collapse into
    // one error so the boundary can't leak which check failed.
    let validation = Validation::default();
    decode::<Claims>(token, key, &validation)
        .map(|data| data.claims.sub)
        .map_err(|_| AuthError::Unauthorized("invalid or expired token".to_string()))
}

impl AuthService {
    /// Verify an access token, returning the subject user id. Used by the
    /// access-control middleware.
    pub fn verify_access(&self, token: &str) -> Result<String, AuthError> {
        self.keys.verify_access(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&AuthConfig::default()).unwrap()
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let keys = keys();
        let access = keys.sign_access("user-1").unwrap();
        let refresh = keys.sign_refresh("user-1").unwrap();

        assert_eq!(keys.verify_access(&access).unwrap(), "user-1");
        assert_eq!(keys.verify_refresh(&refresh).unwrap(), "user-1");
    }

    #[test]
    fn test_token_classes_are_not_interchangeable() {
        let keys = keys();
        let access = keys.sign_access("user-1").unwrap();
        let refresh = keys.sign_refresh("user-1").unwrap();

        assert!(keys.verify_refresh(&access).is_err());
        assert!(keys.verify_access(&refresh).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let keys = keys();
        assert!(keys.verify_access("this.is.not.a.valid.jwt").is_err());
        assert!(keys.verify_access("").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = AuthConfig::default();
        let keys = keys();

        // Expired well past the default leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            jti: new_id(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        assert!(keys.verify_access(&token).is_err());
    }

    #[test]
    fn test_equal_secrets_rejected() {
        let config = AuthConfig {
            refresh_secret: AuthConfig::default().access_secret,
            ..AuthConfig::default()
        };
        assert!(TokenKeys::new(&config).is_err());
    }

    #[test]
    fn test_tokens_for_same_subject_are_unique() {
        let keys = keys();
        let a = keys.sign_refresh("user-1").unwrap();
        let b = keys.sign_refresh("user-1").unwrap();
        assert_ne!(a, b);
    }
}
