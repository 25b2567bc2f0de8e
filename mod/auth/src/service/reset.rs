//! Forgot-password / reset-password flow.
//!
//! The reset token is an opaque random value (not a JWT), stored together
//! with its expiry. Redemption clears both fields in the same conditional
//! update that sets the new password hash, so a token works exactly once.

use argon2::password_hash::rand_core::{OsRng, RngCore};

use crate::mailer::reset_password_body;
use crate::service::{password, AuthError, AuthService};
use crate::util::{now_rfc3339, rfc3339_after};

/// 32 random bytes, hex-encoded: 64 characters.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AuthService {
    /// Start a password reset: generate a token, store it with its expiry,
    /// and mail the reset link.
    ///
    /// Errors with `NotFound` for an unknown email. A later request
    /// supersedes any pending reset for the same account.
    pub fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .store
            .find_user_by_email(email)?
            .ok_or_else(|| AuthError::NotFound("user not found".to_string()))?;

        let token = generate_reset_token();
        let expires_at = rfc3339_after(self.config.reset_token_ttl);
        self.store.set_reset_token(&user.id, &token, &expires_at)?;

        let reset_url = format!(
            "{}/auth/reset-password?token={}",
            self.config.base_url_front, token
        );
        self.mailer
            .send(&user.email, "Reset your password", &reset_password_body(&reset_url))
            .map_err(|e| {
                tracing::error!(error = %e, "failed to send password reset mail");
                AuthError::Internal("failed to send reset email".to_string())
            })?;

        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }

    /// Redeem a reset token: set the new password and invalidate the token.
    ///
    /// Unknown, expired, and already-used tokens all fail the same way.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let invalid =
            || AuthError::Validation("invalid or expired reset token".to_string());

        let now = now_rfc3339();
        if self.store.find_user_by_reset_token(token, &now)?.is_none() {
            return Err(invalid());
        }

        let hash = password::hash_password(new_password)?;
        // Re-checks the token under the same guard; loses gracefully if a
        // concurrent redemption got there first.
        if !self.store.consume_reset_token(token, &hash, &now)? {
            return Err(invalid());
        }

        Ok(())
    }
}
