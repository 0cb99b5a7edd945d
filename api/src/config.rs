//! Configuration for the Call API middleware.

use std::env;

/// Message used when a failed call carries no server-supplied error
pub const DEFAULT_FALLBACK_ERROR: &str = "Something bad happened";

/// Default API base URL (a local WordPress REST root)
pub const DEFAULT_API_URL: &str = "http://localhost:8080/wp-json";

/// API client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Prepended verbatim to every endpoint
    pub base_url: String,
    /// Failure message when the server did not supply one
    pub fallback_error: String,
}

impl ApiConfig {
    /// Create a configuration for the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            fallback_error: DEFAULT_FALLBACK_ERROR.to_string(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `API_URL`: base URL (default `http://localhost:8080/wp-json`)
    /// - `API_FALLBACK_ERROR`: fallback failure message
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let fallback_error =
            env::var("API_FALLBACK_ERROR").unwrap_or_else(|_| DEFAULT_FALLBACK_ERROR.to_string());

        Self {
            base_url,
            fallback_error,
        }
    }

    /// Override the fallback failure message
    #[must_use]
    pub fn with_fallback_error(mut self, message: impl Into<String>) -> Self {
        self.fallback_error = message.into();
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
