pub mod password;
pub mod permission;
pub mod reset;
pub mod role;
pub mod session;
pub mod token;
pub mod user;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::mailer::Mailer;
use crate::provider::IdentityProvider;
use crate::store::{CredentialStore, StoreError};

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these —
// never on the human-readable message string.

/// Stable error code constants.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Auth service error type.
///
/// Client-caused failures (bad credentials, bad/expired/rotated tokens)
/// surface as `Validation`/`Unauthorized`/`Forbidden`; unexpected
/// downstream failures (store, mail, crypto) as `Storage`/`Internal`.
/// Underlying causes are logged where they occur and never reach the
/// client — the response carries only a generic message and a stable code.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate key / resource already exists. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid authentication credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacks required permission. HTTP 403.
    #[error("{0}")]
    Forbidden(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::NotFound(_) => error_code::NOT_FOUND,
            AuthError::Conflict(_) => error_code::ALREADY_EXISTS,
            AuthError::Validation(_) => error_code::VALIDATION_FAILED,
            AuthError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            AuthError::Forbidden(_) => error_code::PERMISSION_DENIED,
            AuthError::Storage(_) => error_code::STORAGE_ERROR,
            AuthError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(m) => AuthError::Conflict(m),
            StoreError::NotFound(m) => AuthError::NotFound(m),
            StoreError::Connection(m) | StoreError::Query(m) => AuthError::Storage(m),
        }
    }
}

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access-token signing secret.
    pub access_secret: String,
    /// Refresh-token signing secret. Must differ from the access secret.
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 1h).
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_token_ttl: i64,
    /// Password-reset token lifetime in seconds (default: 1h).
    pub reset_token_ttl: i64,
    /// Frontend base URL used in reset links and OAuth redirects.
    pub base_url_front: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: "wise-dev-access-secret-change-me".to_string(),
            refresh_secret: "wise-dev-refresh-secret-change-me".to_string(),
            access_token_ttl: 3600,       // 1h
            refresh_token_ttl: 604800,    // 7 days
            reset_token_ttl: 3600,        // 1h
            base_url_front: "http://localhost:3000".to_string(),
        }
    }
}

/// The Auth service. Holds the credential store, mail sender, federated
/// identity providers, signing keys, and configuration.
pub struct AuthService {
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) providers: HashMap<String, Arc<dyn IdentityProvider>>,
    pub(crate) keys: token::TokenKeys,
    pub(crate) config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService with no federated identity providers.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Result<Arc<Self>, AuthError> {
        Self::with_providers(store, mailer, HashMap::new(), config)
    }

    /// Create a new AuthService with the given identity providers,
    /// keyed by provider id (e.g. "google").
    pub fn with_providers(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn Mailer>,
        providers: HashMap<String, Arc<dyn IdentityProvider>>,
        config: AuthConfig,
    ) -> Result<Arc<Self>, AuthError> {
        let keys = token::TokenKeys::new(&config)?;
        Ok(Arc::new(Self {
            store,
            mailer,
            providers,
            keys,
            config,
        }))
    }

    /// Service configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
