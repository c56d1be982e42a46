//! Per-request entry point.
//!
//! Hosts that hand the application one request at a time call
//! [`Entry::handle`]. The binary serves the same router over TCP.

use std::convert::Infallible;

use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

use crate::routes::create_router;
use crate::state::AppState;

/// The application behind a single `handle` call.
///
/// Every request first makes sure the database is connected; a failure is
/// answered with a 500 before the security pipeline runs. Otherwise the
/// request goes through the pipeline, the router and the handler.
#[derive(Clone)]
pub struct Entry {
    router: Router,
}

impl Entry {
    pub fn new(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Self {
        Self {
            router: create_router(state, metrics_handle),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let result: Result<Response, Infallible> = self.router.clone().oneshot(request).await;
        match result {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
