//! Configuration management for the site.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::actions::{ApiRoutes, DEFAULT_BASIC_ROUTE};
use press_api::ApiConfig;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading the configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `APP_ENV` is not a known environment
    #[error("Unknown APP_ENV {0:?}; expected development, production or test")]
    UnknownEnvironment(String),

    /// `METRICS_ADDR` is not a socket address
    #[error("Invalid METRICS_ADDR {value:?}: {reason}")]
    InvalidMetricsAddr {
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    /// Local development; installs the action logger
    #[default]
    Development,
    /// Production
    Production,
    /// Automated tests
    Test,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::UnknownEnvironment(value.to_string())),
        }
    }
}

/// Site configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// API middleware configuration
    pub api: ApiConfig,
    /// Deployment environment
    pub env: AppEnv,
    /// Prometheus scrape address; metrics are off when unset
    pub metrics_addr: Option<SocketAddr>,
    /// Route prefixes
    pub routes: ApiRoutes,
}

impl SiteConfig {
    /// Configuration for `api` with every other setting at its default
    #[must_use]
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            env: AppEnv::default(),
            metrics_addr: None,
            routes: ApiRoutes::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `API_URL`, `API_FALLBACK_ERROR`: see [`ApiConfig::from_env`]
    /// - `APP_ENV`: `development` (default), `production` or `test`
    /// - `METRICS_ADDR`: e.g. `0.0.0.0:9090`; unset disables metrics
    /// - `BASIC_ROUTE`: core route prefix (default `/wp/v2`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `APP_ENV` or `METRICS_ADDR` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .ok()
            .map(|value| value.parse::<AppEnv>())
            .transpose()?
            .unwrap_or_default();

        let metrics_addr = env::var("METRICS_ADDR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                value.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidMetricsAddr {
                    reason: e.to_string(),
                    value,
                })
            })
            .transpose()?;

        let basic = env::var("BASIC_ROUTE").unwrap_or_else(|_| DEFAULT_BASIC_ROUTE.to_string());

        Ok(Self {
            api: ApiConfig::from_env(),
            env,
            metrics_addr,
            routes: ApiRoutes::new(basic),
        })
    }

    /// Override the deployment environment
    #[must_use]
    pub const fn with_env(mut self, env: AppEnv) -> Self {
        self.env = env;
        self
    }

    /// Whether the action logger should be installed
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == AppEnv::Development
    }
}
