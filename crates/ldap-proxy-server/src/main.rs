//! LDAP Proxy Server - Main Entry Point

use clap::Parser;
use ldap_proxy::{DirectorySession, LdapDirectory};
use ldap_proxy_server::{AppState, Args};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        directory = %config.ldap_address,
        base_dn = %config.gateway.directory.base_dn,
        "Starting ldap-proxy"
    );

    let session = DirectorySession::new(Arc::new(LdapDirectory::new()), config.gateway);
    let state = Arc::new(AppState::new(session, config.ldap_address));

    ldap_proxy_server::serve(config.listen, state).await?;

    Ok(())
}
