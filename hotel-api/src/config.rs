//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Command-line overrides (see [`ConfigOverrides`])
//! 2. Environment variables (prefix: HOTEL_, nested keys separated by `__`)
//! 3. Current working directory: ./config.toml (or an explicit path)
//! 4. XDG config directory: ~/.config/hotel-api/config.toml
//! 5. System directory: /etc/hotel-api/config.toml
//! 6. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const APP_NAME: &str = "hotel-api";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Database configuration (in-memory storage when absent)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Per-client rate limiting
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_name")]
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (development, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Time allowed for in-flight requests to finish after a shutdown signal
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing database connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Upper bound for a single query
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Apply embedded migrations at startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Per-client rate limiting configuration (governor-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sustained requests per second per client
    #[serde(default = "default_limiter_rps")]
    pub requests_per_second: f64,

    /// Requests a client may make back to back
    #[serde(default = "default_limiter_burst")]
    pub burst: u32,

    /// Interval between idle-client sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

/// Middleware configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Largest accepted JSON request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Enable panic recovery middleware
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Enable compression
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS mode (permissive, restrictive)
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_limiter_rps(),
            burst: default_limiter_burst(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl DatabaseConfig {
    /// Create a configuration for `url` with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_secs: default_connection_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            query_timeout_secs: default_query_timeout(),
            run_migrations: true,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl LimiterConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

// Default value functions
fn default_name() -> String {
    APP_NAME.to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    25
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1
}

fn default_query_timeout() -> u64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_limiter_rps() -> f64 {
    2.0
}

fn default_limiter_burst() -> u32 {
    4
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    crate::codec::DEFAULT_MAX_BODY_BYTES
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

/// Values set on the command line
///
/// Unset fields are skipped during serialization so they never mask a value
/// from a lower-priority source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "ServiceOverrides::is_empty")]
    pub service: ServiceOverrides,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseOverrides>,
    #[serde(skip_serializing_if = "LimiterOverrides::is_empty")]
    pub limiter: LimiterOverrides,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseOverrides {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LimiterOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
}

impl ServiceOverrides {
    fn is_empty(&self) -> bool {
        self.port.is_none() && self.environment.is_none()
    }
}

impl LimiterOverrides {
    fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.requests_per_second.is_none() && self.burst.is_none()
    }
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Searches ./config.toml, then the XDG config directory, then
    /// /etc/hotel-api. Environment variables override every file.
    pub fn load() -> Result<Self> {
        Self::load_with(None, &ConfigOverrides::default())
    }

    /// Load configuration, optionally from an explicit file, applying `overrides` last
    pub fn load_with(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                // Lowest priority first so later files win
                for path in Self::find_config_paths().iter().rev() {
                    if path.exists() {
                        tracing::info!("Loading configuration from: {}", path.display());
                        figment = figment.merge(Toml::file(path));
                    }
                }
            }
        }

        let config: Config = figment
            .merge(Env::prefixed("HOTEL_").split("__"))
            .merge(Serialized::defaults(overrides))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, ignoring the search path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(Some(path.as_ref()), &ConfigOverrides::default())
    }

    /// Config file paths, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc").join(APP_NAME).join("config.toml"));
        paths
    }

    /// Reject values that would make the server unusable
    pub fn validate(&self) -> Result<()> {
        let limiter = &self.limiter;
        if limiter.enabled {
            if !(limiter.requests_per_second.is_finite() && limiter.requests_per_second > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "limiter.requests_per_second must be a positive number, got {}",
                    limiter.requests_per_second
                )));
            }
            if limiter.burst == 0 {
                return Err(Error::InvalidConfig(
                    "limiter.burst must be at least 1".to_string(),
                ));
            }
            if limiter.sweep_interval_secs == 0 {
                return Err(Error::InvalidConfig(
                    "limiter.sweep_interval_secs must be at least 1".to_string(),
                ));
            }
        }
        if self.middleware.max_body_bytes == 0 {
            return Err(Error::InvalidConfig(
                "middleware.max_body_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get database URL
    pub fn database_url(&self) -> Option<&str> {
        self.database.as_ref().map(|db| db.url.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: default_name(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
                shutdown_grace_secs: default_shutdown_grace(),
            },
            database: None,
            limiter: LimiterConfig::default(),
            middleware: MiddlewareConfig::default(),
        }
    }
}
