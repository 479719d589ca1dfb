//! Tracing setup for applications embedding the counter

use crate::error::{Error, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global fmt subscriber
///
/// `level` is the default directive (`"info"`, `"delicounter=debug"`, ...);
/// `RUST_LOG` is honored on top of it. Fails if a global subscriber is
/// already set.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| Error::Config(format!("Invalid log filter {:?}: {}", level, e)))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))
}

/// Install a JSON-lines subscriber, for log shipping
pub fn init_json_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| Error::Config(format!("Invalid log filter {:?}: {}", level, e)))?;

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))
}
