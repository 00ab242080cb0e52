//! Configuration management for Loan Desk

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, without the `/api` prefix
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub token_path: PathBuf,
    /// Lifetime of a stored bearer token
    pub ttl_hours: i64,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ListConfig {
    pub default_limit: u32,
    pub search_debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub page_size: u32,
    /// Interval at which relative timestamps are recomputed
    pub tick_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix LOANDESK_, e.g. LOANDESK_API__BASE_URL)
            .add_source(
                Environment::with_prefix("LOANDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override backend URL from API_BASE_URL env var if present
            .set_override_option("api.base_url", env::var("API_BASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl ListConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl NotificationConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(".loan-desk/token.json"),
            ttl_hours: 24,
            username: None,
            password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            search_debounce_ms: 400,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            tick_secs: 60,
        }
    }
}
