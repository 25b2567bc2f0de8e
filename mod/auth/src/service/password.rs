//! Password hashing and random-password generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::service::AuthError;

/// Hash a plaintext password with Argon2 (default parameters, fixed work
/// factor). Fails only on underlying primitive failure.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AuthError::Internal("failed to hash password".to_string())
        })
}

/// Verify a plaintext password against a stored hash. Never errors on
/// mismatch — a malformed hash verifies as false.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generate a random password: OS-random bytes, hex-encoded, truncated to
/// `length` characters. Used to give federated accounts a password hash
/// they can never practically guess.
pub fn generate_random_password(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    let mut hex = hex::encode(bytes);
    hex.truncate(length);
    hex
}
