//! API routes.

use axum::middleware;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::catch_panic::CatchPanicLayer;

use crate::auth::require_auth;
use crate::handlers::{
    create_job, current_user, delete_job, get_job, list_jobs, login, not_found, register, show_stats, update_job,
    update_user, welcome,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{auth_rate_limit, ensure_database, panic_response, request_id, request_logging};
use crate::pipeline::run_pipeline;
use crate::state::AppState;

/// Unsupported methods on a known path fall through to the 404 handler.
fn endpoint(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(not_found)
}

/// Create the API router.
///
/// Request flow, outermost first: request id, metrics, panic guard, request
/// logging (outside production), database connection, security pipeline,
/// then routing. The jobs and users trees are wrapped whole by
/// `require_auth`, their unmatched paths included.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/register", endpoint(post(register)))
        .route("/login", endpoint(post(login)))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit))
        .fallback(not_found);

    let job_routes = Router::new()
        .route("/", endpoint(post(create_job).get(list_jobs)))
        .route("/stats", endpoint(get(show_stats)))
        .route("/:id", endpoint(get(get_job).patch(update_job).delete(delete_job)))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let user_routes = Router::new()
        .route("/me", endpoint(get(current_user).patch(update_user)))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = Router::new()
        .route("/api/v1", endpoint(get(welcome)))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/jobs", job_routes)
        .nest("/api/v1/users", user_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), run_pipeline))
        .layer(middleware::from_fn_with_state(state.clone(), ensure_database));

    if !state.config.is_production() {
        app = app.layer(middleware::from_fn(request_logging));
    }
    app = app.layer(CatchPanicLayer::custom(panic_response));

    // Scraping must not depend on the database being reachable
    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    app.merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}
