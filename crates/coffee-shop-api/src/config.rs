//! API configuration types.
//!
//! Everything is read once from the environment at process start.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use coffee_shop_auth::{Algorithm, AuthConfig};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {var}: {reason}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// Parser message.
        reason: String,
    },
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "ApiConfig::default_listen_addr")]
    pub listen_addr: String,

    /// `RocksDB` data directory.
    #[serde(default = "ApiConfig::default_data_dir")]
    pub data_dir: String,

    /// Allowed CORS origins.
    #[serde(default = "ApiConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Insert the sample drink when the store is empty.
    #[serde(default)]
    pub seed_drinks: bool,

    /// Maximum request body size in bytes.
    #[serde(default = "ApiConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> String {
        "./data/coffee-shop".to_string()
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        64 * 1024
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            cors_origins: Self::default_cors_origins(),
            seed_drinks: false,
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Server and token verification settings together.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP server settings.
    pub api: ApiConfig,
    /// Identity provider settings.
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let domain = get("AUTH0_DOMAIN").ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;
        let audience = get("API_AUDIENCE").ok_or(ConfigError::Missing("API_AUDIENCE"))?;

        let mut auth = AuthConfig::new(domain, audience);
        if let Some(path) = get("JWKS_PATH") {
            auth.jwks_path = path;
        }
        auth.issuer = get("AUTH_ISSUER");
        if let Some(algorithm) = parse::<Algorithm>(get("AUTH_ALGORITHM"), "AUTH_ALGORITHM")? {
            auth.algorithm = algorithm;
        }
        if let Some(skew) = parse(get("AUTH_CLOCK_SKEW_SECONDS"), "AUTH_CLOCK_SKEW_SECONDS")? {
            auth.clock_skew_seconds = skew;
        }
        auth.jwks_ttl_seconds = parse(get("JWKS_TTL_SECONDS"), "JWKS_TTL_SECONDS")?;
        if let Some(timeout) = parse(get("JWKS_TIMEOUT_SECONDS"), "JWKS_TIMEOUT_SECONDS")? {
            auth.jwks_timeout_seconds = timeout;
        }
        auth.validate().map_err(|err| ConfigError::Invalid {
            var: "AUTH_ALGORITHM",
            reason: err.to_string(),
        })?;

        let mut api = ApiConfig::default();
        if let Some(addr) = get("LISTEN_ADDR") {
            api.listen_addr = addr;
        }
        if let Some(dir) = get("DATA_DIR") {
            api.data_dir = dir;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            api.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(seed) = parse(get("SEED_DRINKS"), "SEED_DRINKS")? {
            api.seed_drinks = seed;
        }

        Ok(Self { api, auth })
    }
}

fn parse<T>(value: Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .map(|raw| {
            raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
                var,
                reason: err.to_string(),
            })
        })
        .transpose()
}
