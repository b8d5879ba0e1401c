//! Tracing setup.
//!
//! Console fmt output behind an `EnvFilter`. `RUST_LOG` wins over the
//! configured level.

use crate::config::SyncConfig;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Neither `RUST_LOG` nor the configured level is a valid filter.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Install the global subscriber.
pub fn init_tracing(config: &SyncConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}
