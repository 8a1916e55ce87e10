use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

/// IP-keyed governor layer guarding the whole site
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Burst of 100, one token back every 600ms (100 per minute per IP)
pub fn create_global_governor() -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(600)
            .burst_size(100)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config)
}

/// Access log: route, client IP, status and latency for every request
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    // Route template keeps ids out of the log key
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match status {
        StatusCode::TOO_MANY_REQUESTS => tracing::warn!(
            client_ip = %addr.ip(),
            %method,
            route = %route,
            "Rate limit exceeded"
        ),
        s if s.is_server_error() => tracing::error!(
            client_ip = %addr.ip(),
            %method,
            route = %route,
            status = s.as_u16(),
            elapsed_ms,
            "Request failed"
        ),
        s if s.is_client_error() => tracing::warn!(
            client_ip = %addr.ip(),
            %method,
            route = %route,
            status = s.as_u16(),
            elapsed_ms,
            "Request rejected"
        ),
        s => tracing::info!(
            client_ip = %addr.ip(),
            %method,
            route = %route,
            status = s.as_u16(),
            elapsed_ms,
            "Request handled"
        ),
    }

    response
}
