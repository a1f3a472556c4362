//! Command-line flags
//!
//! Every flag is optional and, when given, overrides the value from config
//! files and `HOTEL_*` environment variables.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{ConfigOverrides, DatabaseOverrides};

/// hotel-api - JSON API for hotel guests, rooms and room types
#[derive(Debug, Parser)]
#[command(name = "hotel-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// API server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long = "env")]
    pub environment: Option<String>,

    /// PostgreSQL DSN; without one the API keeps data in memory
    #[arg(long = "db-dsn")]
    pub db_dsn: Option<String>,

    /// Rate limiter maximum requests per second
    #[arg(long)]
    pub limiter_rps: Option<f64>,

    /// Rate limiter maximum burst
    #[arg(long)]
    pub limiter_burst: Option<u32>,

    /// Enable rate limiter
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub limiter_enabled: Option<bool>,

    /// Read configuration from this file instead of the search path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Highest-priority configuration layer built from the flags
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::default();
        overrides.service.port = self.port;
        overrides.service.environment = self.environment.clone();
        overrides.database = self
            .db_dsn
            .clone()
            .filter(|url| !url.is_empty())
            .map(|url| DatabaseOverrides { url });
        overrides.limiter.enabled = self.limiter_enabled;
        overrides.limiter.requests_per_second = self.limiter_rps;
        overrides.limiter.burst = self.limiter_burst;
        overrides
    }
}
