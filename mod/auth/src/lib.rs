//! Auth module — password + federated login, token rotation, role ACL.
//!
//! # Resources
//!
//! - **User** — identity with password hash and the single live refresh token
//! - **Role** — named group of permissions (`admin`, `user` seeded by default)
//! - **Permission** — capability name checked at the HTTP boundary
//!
//! Access and refresh tokens are signed with two independent secrets;
//! refresh is rotation-only (the previous token dies when a new one lands)
//! and password resets redeem a stored one-shot token.
//!
//! # Usage
//!
//! ```ignore
//! use wise_auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(store, mailer, AuthConfig::default())?;
//! module.service().ensure_default_roles()?;
//! let router = module.routes(); // Mounted at /auth
//! ```

pub mod api;
pub mod mailer;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;
pub mod util;

use std::sync::Arc;

use axum::Router;

use crate::mailer::Mailer;
use crate::service::{AuthConfig, AuthError, AuthService};
use crate::store::CredentialStore;

/// Auth module entry point.
///
/// Holds the AuthService and provides HTTP routes for all auth endpoints.
pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    /// Create a new AuthModule with no federated identity providers.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let service = AuthService::new(store, mailer, config)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AuthService.
    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }

    /// Build the HTTP router, rooted at `/auth`.
    pub fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
