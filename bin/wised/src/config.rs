//! Server configuration, read from the environment.

use anyhow::{bail, Result};

/// Environment-derived server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Access-token signing secret (`WISE_ACCESS_TOKEN_SECRET`).
    pub access_token_secret: String,

    /// Refresh-token signing secret (`WISE_REFRESH_TOKEN_SECRET`).
    pub refresh_token_secret: String,

    /// Data directory for the embedded store (`WISE_DATA_DIR`).
    pub data_dir: String,

    /// Frontend base URL for reset links and OAuth redirects
    /// (`WISE_BASE_URL_FRONT`).
    pub base_url_front: String,
}

impl ServerConfig {
    /// Load configuration from the environment, with development defaults
    /// for everything except the signing secrets.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            access_token_secret: require_env("WISE_ACCESS_TOKEN_SECRET")?,
            refresh_token_secret: require_env("WISE_REFRESH_TOKEN_SECRET")?,
            data_dir: env_or("WISE_DATA_DIR", "/var/lib/wise"),
            base_url_front: env_or("WISE_BASE_URL_FRONT", "http://localhost:3000"),
        })
    }

    /// Reject configurations that would weaken token separation.
    pub fn verify(&self) -> Result<()> {
        if self.access_token_secret.is_empty() || self.refresh_token_secret.is_empty() {
            bail!("token secrets must not be empty");
        }
        if self.access_token_secret == self.refresh_token_secret {
            bail!("WISE_ACCESS_TOKEN_SECRET and WISE_REFRESH_TOKEN_SECRET must differ");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => bail!("{} must be set", key),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
