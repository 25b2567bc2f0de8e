//! `wised` — the Wise server binary.
//!
//! Usage:
//!   wised [--listen <addr>]
//!
//! Configuration comes from the environment; see [`config::ServerConfig`].
//! `WISE_ACCESS_TOKEN_SECRET` and `WISE_REFRESH_TOKEN_SECRET` are required
//! and must differ.

mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use wise_auth::mailer::LogMailer;
use wise_auth::service::AuthConfig;
use wise_auth::store::SqliteStore;
use wise_auth::AuthModule;

use config::ServerConfig;

/// Wise server.
#[derive(Parser, Debug)]
#[command(name = "wised", about = "Wise server")]
struct Cli {
    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let server_config = ServerConfig::from_env()?;
    server_config.verify()?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let store = Arc::new(
        SqliteStore::open(&data_dir.join("wise.sqlite"))
            .map_err(|e| anyhow::anyhow!("failed to open credential store: {}", e))?,
    );

    let auth_config = AuthConfig {
        access_secret: server_config.access_token_secret.clone(),
        refresh_secret: server_config.refresh_token_secret.clone(),
        base_url_front: server_config.base_url_front.clone(),
        ..Default::default()
    };
    let auth_module = AuthModule::new(store, Arc::new(LogMailer), auth_config)
        .map_err(|e| anyhow::anyhow!("failed to initialize auth module: {}", e))?;

    // Bootstrap: seed default roles and permissions.
    auth_module
        .service()
        .ensure_default_roles()
        .map_err(|e| anyhow::anyhow!("failed to seed default roles: {}", e))?;
    info!("Auth module initialized");

    let app = auth_module.routes();

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Wise server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
