//! Configuration types for paveos-api.

use std::env;

/// Default API URL used for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Versioned path prefix every REST endpoint lives under.
const API_PREFIX: &str = "/api/v1";

/// Configuration for connecting to the PaveOS backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API including the versioned prefix
    /// (e.g., "https://api.paveos.com/api/v1").
    pub base_url: String,
    /// Explicit realtime server URL. When None it is derived from `base_url`.
    pub socket_url: Option<String>,
}

impl ApiConfig {
    /// Create a new configuration with the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            socket_url: None,
        }
    }

    /// Override the realtime server URL.
    pub fn with_socket_url(mut self, socket_url: impl Into<String>) -> Self {
        self.socket_url = Some(socket_url.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PAVEOS_API_URL` | REST API base URL | `http://localhost:5000/api/v1` |
    /// | `PAVEOS_SOCKET_URL` | Realtime server URL | API URL without `/api/v1` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("PAVEOS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(base_url));
        }

        let mut config = Self::new(base_url);
        if let Ok(socket_url) = env::var("PAVEOS_SOCKET_URL") {
            if !socket_url.is_empty() {
                config = config.with_socket_url(socket_url);
            }
        }
        Ok(config)
    }

    /// Build the full URL for an endpoint path such as `/leads/123`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Realtime server URL. Socket connections go to the server root, so the
    /// versioned API prefix is stripped when no explicit URL is configured.
    pub fn socket_url(&self) -> String {
        match &self.socket_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self
                .base_url
                .strip_suffix(API_PREFIX)
                .unwrap_or(&self.base_url)
                .to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PAVEOS_API_URL must be an http(s) URL, got {0:?}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_strips_api_prefix() {
        let config = ApiConfig::new("https://api.paveos.com/api/v1");
        assert_eq!(config.socket_url(), "https://api.paveos.com");
    }

    #[test]
    fn test_socket_url_without_prefix_is_unchanged() {
        let config = ApiConfig::new("http://127.0.0.1:5000");
        assert_eq!(config.socket_url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn test_explicit_socket_url_wins() {
        let config = ApiConfig::default().with_socket_url("wss://rt.paveos.com/");
        assert_eq!(config.socket_url(), "wss://rt.paveos.com");
    }

    #[test]
    fn test_endpoint_joins_path() {
        let config = ApiConfig::new("http://localhost:5000/api/v1/");
        assert_eq!(config.endpoint("/leads/L1"), "http://localhost:5000/api/v1/leads/L1");
    }
}
