//! Structured logging

use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::Result};

/// Install the JSON log subscriber
///
/// `service.log_level` accepts any `EnvFilter` directive; an unparsable value
/// falls back to `info`. Calling this twice is an error reported by the
/// subscriber registry, not a panic.
pub fn init_tracing(config: &Config) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(build_filter(&config.service.log_level))
        .try_init()
        .map_err(|e| crate::error::Error::Internal(format!("failed to install subscriber: {e}")))?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "Tracing initialized"
    );

    Ok(())
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}
