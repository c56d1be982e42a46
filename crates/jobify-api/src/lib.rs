//! Axum HTTP API server for Jobify.
//!
//! This crate provides:
//! - Registration, login and profile endpoints with bearer tokens
//! - Per-user job application CRUD, search and statistics
//! - A security pipeline (body parsing, hardening headers, input sanitizing,
//!   query-operator stripping) in front of every route
//! - A per-request entry point that connects to the database first
//! - Rate limiting of credential endpoints and Prometheus metrics

pub mod auth;
pub mod config;
pub mod entry;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod password;
pub mod pipeline;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use entry::Entry;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
