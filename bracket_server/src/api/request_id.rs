//! Request correlation and HTTP instrumentation.
//!
//! Each request carries an `x-request-id` (the caller's, or a fresh uuid v4)
//! through the handlers and back in the response. The middleware also feeds
//! the HTTP request counters and latency histogram, labelled by route
//! template rather than raw path so tournament ids never become labels.

use crate::metrics;
use axum::{
    extract::{FromRequestParts, MatchedPath, Request},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id attached to every request's extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse a non-empty caller id, otherwise mint a new one.
    fn resolve(headers: &HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "request id middleware is not installed",
        ))
    }
}

fn route_label(request: &Request) -> String {
    match request.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => request.uri().path().to_string(),
    }
}

/// Tag the request, time it, and stamp the id on the response.
///
/// ```no_run
/// use axum::{Router, middleware, routing::get};
/// use bracket_server::api::request_id::request_id_middleware;
///
/// let app: Router = Router::new()
///     .route("/health", get(|| async { "ok" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// ```
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::resolve(request.headers());
    let method = request.method().clone();
    let route = route_label(&request);

    tracing::debug!(request_id = %id.as_str(), %method, uri = %request.uri(), "request received");
    request.extensions_mut().insert(id.clone());

    let started = Instant::now();
    let mut response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    metrics::http_requests_total(method.as_str(), &route, status.as_u16());
    metrics::http_request_duration_ms(method.as_str(), &route, elapsed_ms);

    tracing::info!(
        request_id = %id.as_str(),
        %method,
        route = %route,
        status = status.as_u16(),
        duration_ms = elapsed_ms,
        "request handled"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("bracket-42"));

        assert_eq!(RequestId::resolve(&headers).as_str(), "bracket-42");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let id = RequestId::resolve(&HeaderMap::new());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_blank_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("  "));

        let id = RequestId::resolve(&headers);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }
}
