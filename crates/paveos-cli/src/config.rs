//! Configuration loaded from environment variables.

use std::env;

use paveos_api::ApiConfig;
use session_store::DEFAULT_SESSION_DB;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// REST and realtime endpoints.
    pub api: ApiConfig,
    /// SQLite URL of the persisted session.
    pub session_db: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PAVEOS_API_URL` | REST API base URL | `http://localhost:5000/api/v1` |
    /// | `PAVEOS_SOCKET_URL` | Realtime server URL | API URL without `/api/v1` |
    /// | `PAVEOS_SESSION_DB` | Session database URL | `sqlite:paveos-session.db?mode=rwc` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api = ApiConfig::from_env()?;

        let session_db = env::var("PAVEOS_SESSION_DB")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_DB.to_string());
        if !session_db.starts_with("sqlite:") {
            return Err(ConfigError::InvalidSessionDb(session_db));
        }

        Ok(Self { api, session_db })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Api(#[from] paveos_api::ConfigError),

    #[error("PAVEOS_SESSION_DB must be a sqlite: URL, got {0}")]
    InvalidSessionDb(String),
}
