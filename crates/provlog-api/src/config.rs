//! Process configuration
//!
//! Read from the environment once at startup and threaded explicitly into
//! components. No globals.

use std::net::SocketAddr;
use std::time::Duration;

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary store connection string.
    pub database_url: String,
    /// Pre-shared authentication key.
    pub api_key: String,
    /// Archive root directory.
    pub archive_path: String,
    /// Comma-separated CORS origins, or `*`.
    pub cors_allow_origins: String,
    /// Server bind address.
    pub addr: SocketAddr,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Max request body size (bytes).
    pub max_body_size: usize,
    /// Bound on individual primary-store operations inside an append.
    pub store_timeout: Duration,
    /// Bound on the post-commit archive write.
    pub archive_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:provlog.db?mode=rwc".to_string(),
            api_key: "dev-api-key-change-me".to_string(),
            archive_path: "./archive".to_string(),
            cors_allow_origins: "*".to_string(),
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024, // 1MB
            store_timeout: Duration::from_secs(10),
            archive_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Build configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = match std::env::var("API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("API_KEY not set, using the development default");
                defaults.api_key
            }
        };

        let port: u16 = std::env::var("PROVLOG_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let timeout_secs: u64 = std::env::var("PROVLOG_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(30);

        Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            api_key,
            archive_path: std::env::var("ARCHIVE_PATH").unwrap_or(defaults.archive_path),
            cors_allow_origins: std::env::var("CORS_ALLOW_ORIGINS")
                .unwrap_or(defaults.cors_allow_origins),
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            request_timeout: Duration::from_secs(timeout_secs),
            ..defaults
        }
    }
}
