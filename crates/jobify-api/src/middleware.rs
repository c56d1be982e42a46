//! API middleware.

use std::any::Any;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Response as HttpResponse};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::pipeline::ProtectiveHeaders;
use crate::state::AppState;

/// Connect to the store before anything else runs.
///
/// On success the live repositories are attached to the request extensions.
/// On failure the request is answered with a 500 and never enters the
/// pipeline or the router.
pub async fn ensure_database(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match state.data.connect().await {
        Ok(repos) => {
            request.extensions_mut().insert(repos);
            next.run(request).await
        }
        Err(e) => {
            metrics::record_db_unavailable();
            ApiError::from(e).into_response()
        }
    }
}

/// Request ID middleware.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-ID", header_value);
    }

    response
}

/// Request id attached to the request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Request logging middleware. Installed outside production only.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Per-IP limiter for the credential endpoints.
pub struct AuthRateLimiter {
    limiter: KeyedLimiter,
}

impl AuthRateLimiter {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// True if the request from `ip` is allowed.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Forget clients whose quota has fully replenished.
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Rate limiting middleware for the credential endpoints.
///
/// Requests whose client address cannot be determined are let through.
pub async fn auth_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ip) = client_ip(&request, state.config.trust_proxy_headers) {
        if !state.auth_limiter.check(ip) {
            warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
            metrics::record_rate_limit_hit(request.uri().path());
            return ApiError::RateLimited.into_response();
        }
    }

    next.run(request).await
}

/// Extract the client IP.
///
/// Forwarding headers are client controlled, so they are only read when the
/// server sits behind a proxy that sets them (`trust_proxy` on). Otherwise the
/// peer address from the connection is used.
pub fn client_ip(request: &Request, trust_proxy: bool) -> Option<IpAddr> {
    let forwarded = if trust_proxy { forwarded_ip(request.headers()) } else { None };
    forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // First entry of X-Forwarded-For is the original client
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    forwarded.or_else(|| {
        headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// Turn a panic anywhere below the guard into the generic 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> HttpResponse<Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "Request panicked");
    let mut response = ApiError::internal(detail).into_response();
    ProtectiveHeaders::insert_into(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_forwarded_ip_prefers_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(forwarded_ip(&headers), Some("203.0.113.7".parse().unwrap()));

        headers.remove("X-Forwarded-For");
        assert_eq!(forwarded_ip(&headers), Some("198.51.100.2".parse().unwrap()));

        headers.insert("X-Real-IP", HeaderValue::from_static("not-an-ip"));
        assert_eq!(forwarded_ip(&headers), None);
    }

    #[test]
    fn test_client_ip_ignores_forwarding_headers_unless_trusted() {
        let peer: SocketAddr = "192.0.2.1:40000".parse().unwrap();
        let mut request = axum::http::Request::builder()
            .header("X-Forwarded-For", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        assert_eq!(client_ip(&request, false), Some(peer.ip()));
        assert_eq!(client_ip(&request, true), Some("203.0.113.7".parse().unwrap()));

        request.headers_mut().remove("X-Forwarded-For");
        assert_eq!(client_ip(&request, true), Some(peer.ip()));
    }

    #[test]
    fn test_limiter_is_per_ip() {
        let limiter = AuthRateLimiter::per_minute(2);
        let a: IpAddr = "203.0.113.7".parse().unwrap();
        let b: IpAddr = "203.0.113.8".parse().unwrap();

        assert!(limiter.check(a));
        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[tokio::test]
    async fn test_panic_response_is_generic() {
        let response = panic_response(Box::new("db password is hunter2"));
        assert_eq!(response.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("Something went wrong, try again later"));
    }
}
