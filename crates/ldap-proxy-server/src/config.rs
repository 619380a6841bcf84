//! Server Configuration
//!
//! Flags and environment variables, resolved into a [`ServerConfig`].

use clap::Parser;
use ldap_proxy::{GatewayConfig, ProxyError, ProxyResult};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "ldap-proxy-server")]
#[command(version)]
#[command(about = "Search an LDAP directory over HTTP", long_about = None)]
pub struct Args {
    /// Listen and serve at this address
    #[arg(long, env = "LISTEN_ADDRESS", default_value = ":8082")]
    pub address: String,

    /// Directory server address (host:port)
    #[arg(long, env = "LDAP_ADDRESS")]
    pub ldap_address: String,

    /// JSON file with directory and exclusion settings
    #[arg(long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Accept any directory server certificate
    #[arg(long, env = "LDAP_INSECURE_SKIP_VERIFY")]
    pub insecure_skip_verify: bool,
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket to listen on
    pub listen: SocketAddr,
    /// Directory server address
    pub ldap_address: String,
    /// Pipeline settings
    pub gateway: GatewayConfig,
}

impl Args {
    /// Resolve into a [`ServerConfig`]
    pub fn into_config(self) -> ProxyResult<ServerConfig> {
        let ldap_address = self.ldap_address.trim().to_string();
        if ldap_address.is_empty() {
            return Err(ProxyError::Config("LDAP_ADDRESS is not set".into()));
        }

        let mut gateway = match &self.config {
            Some(path) => GatewayConfig::load_or_default(path)?,
            None => GatewayConfig::default(),
        };
        if self.insecure_skip_verify {
            gateway.directory.tls.skip_verify = true;
        }

        Ok(ServerConfig {
            listen: parse_listen_address(&self.address)?,
            ldap_address,
            gateway,
        })
    }
}

/// Parse a listen address; a bare `:port` listens on all interfaces.
pub fn parse_listen_address(address: &str) -> ProxyResult<SocketAddr> {
    let full = match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => address.to_string(),
    };
    full.parse()
        .map_err(|e| ProxyError::Config(format!("invalid listen address {address:?}: {e}")))
}
