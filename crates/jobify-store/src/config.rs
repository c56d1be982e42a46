//! Store configuration.

use std::time::Duration;

/// Database used when the connection string does not name one.
pub const DEFAULT_DATABASE: &str = "jobify";

/// MongoDB client configuration.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Database name, used when the URL has no path component
    pub default_database: String,
    /// Application name reported to the server
    pub app_name: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// How long to wait for a suitable server
    pub server_selection_timeout: Duration,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            default_database: DEFAULT_DATABASE.to_string(),
            app_name: concat!("jobify-store/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(5),
            server_selection_timeout: Duration::from_secs(10),
        }
    }
}

impl MongoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_database: std::env::var("MONGO_DB")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.default_database),
            app_name: defaults.app_name,
            connect_timeout: std::env::var("MONGO_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            server_selection_timeout: std::env::var("MONGO_SERVER_SELECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.server_selection_timeout),
        }
    }
}
