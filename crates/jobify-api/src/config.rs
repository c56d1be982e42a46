//! API configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// MongoDB connection string
    pub mongo_url: String,
    /// Token signing secret
    pub jwt_secret: String,
    /// Token lifetime
    pub jwt_lifetime: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
    /// Credential attempts allowed per IP per minute
    pub auth_rate_limit_per_minute: u32,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP` instead of the peer address
    pub trust_proxy_headers: bool,
    /// Expose `/metrics`
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,
    /// Argon2 iterations
    pub password_iterations: u32,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mongo_url", &"[redacted]")
            .field("jwt_secret", &"[redacted]")
            .field("jwt_lifetime", &self.jwt_lifetime)
            .field("max_body_size", &self.max_body_size)
            .field("auth_rate_limit_per_minute", &self.auth_rate_limit_per_minute)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            mongo_url: String::new(),
            jwt_secret: String::new(),
            jwt_lifetime: Duration::from_secs(24 * 60 * 60),
            max_body_size: 100 * 1024, // 100KB
            auth_rate_limit_per_minute: 10,
            trust_proxy_headers: false,
            metrics_enabled: false,
            environment: "development".to_string(),
            password_memory_kib: 19 * 1024,
            password_iterations: 2,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_lifetime = match std::env::var("JWT_LIFETIME") {
            Ok(value) => parse_lifetime(&value).ok_or(ConfigError::Invalid {
                name: "JWT_LIFETIME",
                value,
            })?,
            Err(_) => defaults.jwt_lifetime,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            mongo_url: required("MONGO_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_lifetime,
            max_body_size: parse_var("MAX_BODY_SIZE", defaults.max_body_size)?,
            auth_rate_limit_per_minute: parse_var("AUTH_RATE_LIMIT_PER_MINUTE", defaults.auth_rate_limit_per_minute)?,
            trust_proxy_headers: env_flag("TRUST_PROXY_HEADERS"),
            metrics_enabled: env_flag("METRICS_ENABLED"),
            environment: std::env::var("NODE_ENV").unwrap_or(defaults.environment),
            password_memory_kib: parse_var("PASSWORD_MEMORY_KIB", defaults.password_memory_kib)?,
            password_iterations: parse_var("PASSWORD_ITERATIONS", defaults.password_iterations)?,
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "true" || v == "1").unwrap_or(false)
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Parse a token lifetime such as `1d`, `12h`, `30m`, `45s` or a bare number
/// of seconds.
pub fn parse_lifetime(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);
    let amount: u64 = amount.parse().ok()?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    let secs = amount.checked_mul(multiplier)?;
    (secs > 0).then(|| Duration::from_secs(secs))
}
