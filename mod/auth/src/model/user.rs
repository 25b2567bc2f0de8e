use serde::{Deserialize, Serialize};

/// A user identity.
///
/// Every user row carries a password hash — accounts provisioned through a
/// federated login get a random hashed password so the password login path
/// can treat all rows uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Email address (unique).
    pub email: String,

    /// Argon2 password hash. Absent only for rows created before the first
    /// hash was set; such accounts cannot log in with a password.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,

    /// The single currently-valid refresh token for this user, if any.
    /// Overwritten on every login and refresh — "one active session".
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,

    /// Pending password-reset token. Set and cleared together with
    /// `reset_token_expires`.
    #[serde(default, skip_serializing)]
    pub reset_token: Option<String>,

    /// RFC 3339 expiry for the pending reset token.
    #[serde(default, skip_serializing)]
    pub reset_token_expires: Option<String>,

    /// Avatar URL (may come from a federated provider).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for registering a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// An externally-verified identity assertion from a federated login
/// (e.g. a decoded OIDC ID token). The provider has already verified it;
/// this module only checks the fields it needs are present.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}
