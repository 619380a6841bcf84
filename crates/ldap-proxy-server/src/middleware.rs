//! Request middleware for logging and CORS

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderName, Method, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Logging middleware
pub async fn logging(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".into());

    let response = next.run(request).await;

    // Streamed bodies are still being written at this point; the latency
    // covers the time to the first byte.
    tracing::info!(
        method = %method,
        uri = %uri,
        remote = %remote,
        status = %response.status(),
        latency_us = start.elapsed().as_micros() as u64,
        "served request"
    );

    response
}

/// CORS policy: mirror the caller's origin, answer preflights directly
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
        ])
}
