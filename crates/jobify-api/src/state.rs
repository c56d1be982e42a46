//! Application state.

use std::sync::Arc;

use jobify_store::{DataSource, MongoConfig, MongoDataSource};

use crate::auth::TokenService;
use crate::config::{ApiConfig, ConfigError};
use crate::middleware::AuthRateLimiter;
use crate::password::Passwords;
use crate::pipeline::Pipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub data: Arc<dyn DataSource>,
    pub tokens: Arc<TokenService>,
    pub passwords: Arc<Passwords>,
    pub pipeline: Arc<Pipeline>,
    pub auth_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    /// Create application state over any data source.
    ///
    /// Nothing is dialed here; the first request connects.
    pub fn new(config: ApiConfig, data: Arc<dyn DataSource>) -> Result<Self, ConfigError> {
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let tokens = TokenService::new(&config.jwt_secret, config.jwt_lifetime);
        let passwords = Passwords::new(config.password_memory_kib, config.password_iterations)?;
        let auth_limiter = AuthRateLimiter::per_minute(config.auth_rate_limit_per_minute);

        Ok(Self {
            config: Arc::new(config),
            data,
            tokens: Arc::new(tokens),
            passwords: Arc::new(passwords),
            pipeline: Arc::new(Pipeline::standard()),
            auth_limiter: Arc::new(auth_limiter),
        })
    }

    /// Create application state backed by MongoDB.
    pub fn with_mongo(config: ApiConfig) -> Result<Self, ConfigError> {
        let data = MongoDataSource::new(config.mongo_url.clone(), MongoConfig::from_env());
        Self::new(config, Arc::new(data))
    }
}
