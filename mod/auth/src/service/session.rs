//! Login, token refresh, and federated login.
//!
//! A user holds at most one valid refresh token. Login overwrites it;
//! refresh replaces it through a compare-and-swap on the stored value, so
//! the previous token becomes permanently unusable the moment a rotation
//! lands — including the stale copies in concurrent refresh attempts.

use crate::model::{IdentityClaims, TokenPair};
use crate::service::{password, AuthError, AuthService};

fn invalid_credentials() -> AuthError {
    AuthError::Unauthorized("invalid credentials".to_string())
}

fn invalid_refresh() -> AuthError {
    AuthError::Unauthorized("invalid or expired refresh token".to_string())
}

impl AuthService {
    /// Password login. Mints a fresh access+refresh pair and persists the
    /// refresh token, revoking any previous session.
    ///
    /// Unknown email, missing password hash, and wrong password all return
    /// the same error — no user enumeration.
    pub fn login(&self, email: &str, pw: &str) -> Result<TokenPair, AuthError> {
        let Some(user) = self.store.find_user_by_email(email)? else {
            return Err(invalid_credentials());
        };
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(invalid_credentials());
        };
        if !password::verify_password(pw, hash) {
            return Err(invalid_credentials());
        }

        let token = self.keys.sign_access(&user.id)?;
        let refresh_token = self.keys.sign_refresh(&user.id)?;
        self.store.set_refresh_token(&user.id, &refresh_token)?;

        tracing::debug!(user_id = %user.id, "login succeeded");
        Ok(TokenPair { token, refresh_token })
    }

    /// Rotate a refresh token: verify it, then swap the stored value for a
    /// brand-new token in one conditional update. "Never issued", "already
    /// rotated", and "logged out elsewhere" all fail the same way.
    pub fn refresh(&self, old_refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self
            .keys
            .verify_refresh(old_refresh_token)
            .map_err(|_| invalid_refresh())?;

        let refresh_token = self.keys.sign_refresh(&user_id)?;
        let rotated =
            self.store
                .rotate_refresh_token(&user_id, old_refresh_token, &refresh_token)?;
        if !rotated {
            // Stored value didn't match (or the user is gone): the token
            // was valid once but is no longer the live one.
            return Err(invalid_refresh());
        }

        let token = self.keys.sign_access(&user_id)?;
        Ok(TokenPair { token, refresh_token })
    }

    /// Federated login from an externally-verified identity assertion.
    ///
    /// Provisions an account on first sight (random hashed password,
    /// default role); repeated logins with the same email always resolve
    /// to that same account. Issues an access token only — no refresh
    /// token is minted on this path.
    pub fn federated_login(&self, claims: IdentityClaims) -> Result<String, AuthError> {
        let (Some(email), Some(name)) = (claims.email.as_deref(), claims.name.as_deref())
        else {
            return Err(AuthError::Validation(
                "email or name missing from identity assertion".to_string(),
            ));
        };
        if email.is_empty() || name.is_empty() {
            return Err(AuthError::Validation(
                "email or name missing from identity assertion".to_string(),
            ));
        }

        let user = match self.store.find_user_by_email(email)? {
            Some(user) => user,
            None => {
                tracing::info!(email, "provisioning account for first federated login");
                self.provision_federated_user(email, name, claims.picture)?
            }
        };

        self.keys.sign_access(&user.id)
    }

    /// Exchange an authorization code through the named identity provider.
    pub async fn oauth_exchange(
        &self,
        provider_id: &str,
        code: &str,
    ) -> Result<IdentityClaims, AuthError> {
        let provider = self.providers.get(provider_id).ok_or_else(|| {
            AuthError::NotFound(format!("unknown identity provider '{}'", provider_id))
        })?;

        provider.exchange(code).await.map_err(|e| {
            tracing::error!(provider_id, error = %e, "identity provider exchange failed");
            AuthError::Internal("failed to process provider callback".to_string())
        })
    }
}
