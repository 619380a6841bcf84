//! API Handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ldap_proxy::ProxyError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::json_stream;
use crate::AppState;

/// Content type of search responses
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

/// Search failure surfaced before any result was written
#[derive(Debug)]
pub struct SearchFailure(pub ProxyError);

impl SearchFailure {
    fn status(&self) -> (StatusCode, &'static str) {
        match self.0 {
            ProxyError::Connection { .. } => (StatusCode::BAD_GATEWAY, "directory_unavailable"),
            ProxyError::Search { .. } => (StatusCode::BAD_GATEWAY, "search_failed"),
            ProxyError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "directory_timeout"),
            ProxyError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            ProxyError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured"),
        }
    }
}

impl IntoResponse for SearchFailure {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let body = ErrorResponse {
            code: code.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Stream people matching `query` as a JSON array
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Response, SearchFailure> {
    let persons = state
        .session
        .search(&state.ldap_address, &query, CancellationToken::new())
        .await
        .map_err(|e| {
            tracing::error!(
                address = %state.ldap_address,
                query = %query,
                error = %e,
                "Directory search failed"
            );
            SearchFailure(e)
        })?;

    let body = Body::from_stream(json_stream::render(persons));
    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}
