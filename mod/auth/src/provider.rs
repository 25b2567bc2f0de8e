//! Federated identity boundary.
//!
//! An [`IdentityProvider`] exchanges an OAuth authorization code for a
//! verified [`IdentityClaims`] assertion. The exchange (HTTP round-trips,
//! signature checks on the provider's ID token) happens entirely inside the
//! provider implementation — the auth service trusts what comes back.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::IdentityClaims;

/// Identity provider failure.
#[derive(Debug, Error)]
#[error("provider exchange: {0}")]
pub struct ProviderError(pub String);

/// Exchanges an authorization code for an identity assertion.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<IdentityClaims, ProviderError>;
}
