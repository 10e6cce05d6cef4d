//! Middleware for the Provlog API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use subtle::ConstantTimeEq;

use crate::error::ApiError;
use crate::state::AppState;

/// Paths reachable without a key: the banner and the health probe.
fn is_public(path: &str) -> bool {
    path == "/" || path == "/health"
}

/// Pre-shared-key authentication.
///
/// Compares the `X-API-Key` header against the configured key in constant
/// time; missing or wrong keys get the same 401 shape.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_public(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing X-API-Key header".to_string()))?;

    let expected = state.config().api_key.as_bytes();
    if !bool::from(presented.as_bytes().ct_eq(expected)) {
        return Err(ApiError::Unauthorized("Invalid API key".to_string()));
    }

    Ok(next.run(request).await)
}

/// Request tracing middleware: one span per request, latency logged on exit.
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = tracing::info_span!("http_request", method = %method, path = %path);
    let response = {
        let _enter = span.enter();
        next.run(request).await
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "request completed"
    );

    response
}

/// CORS layer from the configured origin list (`*` allows any origin).
pub fn cors_layer(cors_allow_origins: &str) -> tower_http::cors::CorsLayer {
    use axum::http::{header, HeaderName, Method};
    use tower_http::cors::{AllowOrigin, Any, CorsLayer};

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ]);

    if cors_allow_origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = cors_allow_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Request body size limit.
pub fn body_limit_layer(limit: usize) -> tower_http::limit::RequestBodyLimitLayer {
    tower_http::limit::RequestBodyLimitLayer::new(limit)
}

/// Whole-request timeout.
#[allow(deprecated)]
pub fn timeout_layer(duration: std::time::Duration) -> tower_http::timeout::TimeoutLayer {
    tower_http::timeout::TimeoutLayer::new(duration)
}
