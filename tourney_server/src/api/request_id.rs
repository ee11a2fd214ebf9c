//! Request ID middleware for tracing and debugging.
//!
//! Every request gets a correlation id, taken from the `x-request-id` header
//! when the caller sends one, and echoed back on the response. The middleware
//! also records the per-request log line and HTTP metrics.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::{logging, metrics};

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate or extract request ID from headers
fn get_or_generate_request_id(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware to add request ID to all requests and responses
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use tourney_server::api::request_id::request_id_middleware;
///
/// # async fn example() {
/// let app: Router = Router::new()
///     .route("/", get(|| async { "Hello" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// # }
/// ```
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = get_or_generate_request_id(request.headers());

    // Store request ID in request extensions for access by handlers
    request.extensions_mut().insert(RequestId(request_id.clone()));

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    // Route template keeps the metric label set bounded
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        "Request started"
    );

    let response = next.run(request).await;

    // Add request ID to response headers
    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    let elapsed = started.elapsed();
    let status = parts.status.as_u16();
    logging::log_api_request(
        &method,
        &path,
        status,
        elapsed.as_millis() as u64,
        &request_id,
    );
    metrics::http_requests_total(&method, &route, status);
    metrics::http_request_duration_ms(&method, &route, elapsed.as_secs_f64() * 1000.0);

    Response::from_parts(parts, body)
}

/// Request ID wrapper for extracting from request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    /// Get the request ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Axum extractor for request ID
impl<S> axum::extract::FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Request ID not found in extensions",
            ))
    }
}
