//! LDAP Proxy Server
//!
//! HTTP front end for the directory search pipeline:
//! - `GET /search/{query}` streams matching people as a JSON array
//! - `GET /health` reports liveness
//! - CORS headers mirror the caller's origin

#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod json_stream;
pub mod middleware;

use axum::{routing::get, Router};
use ldap_proxy::DirectorySession;
use std::net::SocketAddr;
use std::sync::Arc;

pub use config::{Args, ServerConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Search pipeline
    pub session: DirectorySession,
    /// Directory server address (host:port)
    pub ldap_address: String,
}

impl AppState {
    /// Create state searching the directory at `ldap_address`
    pub fn new(session: DirectorySession, ldap_address: impl Into<String>) -> Self {
        Self {
            session,
            ldap_address: ldap_address.into(),
        }
    }
}

/// Build the API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/search/:query", get(handlers::search))
        .layer(axum::middleware::from_fn(middleware::logging))
        .layer(middleware::cors_layer())
        .with_state(state)
}

/// Start the proxy server
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), std::io::Error> {
    let app = build_router(state);

    tracing::info!("ldap-proxy listening at {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
