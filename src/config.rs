//! Environment-driven configuration.
//!
//! All knobs come from the process environment with sensible defaults, so
//! the binary runs unconfigured on a laptop and picks up platform settings
//! (PORT, APP_ENV, ...) when deployed.

use std::time::Duration;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the listener on.
    pub host: String,
    /// Port to bind the listener on.
    pub port: u16,
    /// Deployment environment name reported by the health endpoint.
    pub environment: String,
    /// Path of the SQLite database file.
    pub database_path: String,
    /// When true, requests from unlisted origins are blocked instead of
    /// logged and permitted.
    pub cors_enforce: bool,
    /// Delay between startup readiness probes.
    pub startup_retry_delay: Duration,
}

impl Config {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "tasks.db".to_string()),
            cors_enforce: std::env::var("CORS_ENFORCE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            startup_retry_delay: Duration::from_secs(
                std::env::var("STARTUP_RETRY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }

    /// `host:port` string for the listener bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            database_path: "tasks.db".to_string(),
            cors_enforce: false,
            startup_retry_delay: Duration::from_secs(5),
        }
    }
}
