//! Persistence boundary for the auth module.
//!
//! The rest of the crate only talks to [`CredentialStore`] — keyed lookups
//! plus the two conditional writes the token invariants depend on. The
//! embedded [`SqliteStore`] implementation lives in [`sqlite`].

pub mod sqlite;

pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::model::{Permission, Role, User};

/// Store-level error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection: {0}")]
    Connection(String),

    #[error("query: {0}")]
    Query(String),
}

/// The credential store consumed by the auth service.
///
/// Implementations must make each method an atomic unit — in particular
/// [`rotate_refresh_token`](CredentialStore::rotate_refresh_token) and
/// [`consume_reset_token`](CredentialStore::consume_reset_token) are
/// update-with-precondition operations: under concurrent calls with the
/// same expected value, exactly one succeeds.
pub trait CredentialStore: Send + Sync {
    fn create_user(&self, user: &User) -> Result<(), StoreError>;

    fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Find the user holding `token` as a pending reset token that expires
    /// strictly after `now` (RFC 3339).
    fn find_user_by_reset_token(&self, token: &str, now: &str)
        -> Result<Option<User>, StoreError>;

    /// Unconditionally store `token` as the user's single refresh token,
    /// replacing any previous value.
    fn set_refresh_token(&self, user_id: &str, token: &str) -> Result<(), StoreError>;

    /// Replace the stored refresh token with `new` only if the current
    /// value equals `old`. Returns whether the swap happened.
    fn rotate_refresh_token(&self, user_id: &str, old: &str, new: &str)
        -> Result<bool, StoreError>;

    /// Store a pending reset token and its expiry as a pair, replacing any
    /// prior pending reset.
    fn set_reset_token(&self, user_id: &str, token: &str, expires_at: &str)
        -> Result<(), StoreError>;

    /// Set the password hash and clear both reset fields in one update,
    /// guarded by `reset_token = token AND reset_token_expires > now`.
    /// Returns whether a row matched (single-use enforcement).
    fn consume_reset_token(&self, token: &str, new_password_hash: &str, now: &str)
        -> Result<bool, StoreError>;

    fn create_role(&self, role: &Role) -> Result<(), StoreError>;

    fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    fn create_permission(&self, permission: &Permission) -> Result<(), StoreError>;

    fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError>;

    /// Link a permission to a role. Idempotent.
    fn link_role_permission(&self, role_id: &str, permission_id: &str)
        -> Result<(), StoreError>;

    /// Link a role to a user. Idempotent.
    fn create_user_role_link(&self, user_id: &str, role_id: &str) -> Result<(), StoreError>;

    /// The union of permission names across all of the user's roles.
    fn user_permissions(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}
