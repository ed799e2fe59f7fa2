//! Structured logging.
//!
//! # Responsibilities
//! - Install the process-wide tracing subscriber
//! - Pick the log level from `RUST_LOG`, falling back to config
//!
//! # Design Decisions
//! - JSON lines for production, pretty output for development
//! - A second initialization is reported, never a panic
//! - Outbound-call timing uses the [`EXTERNAL_TARGET`] target so it can be
//!   filtered on its own (`RUST_LOG=interservice::external=debug`)

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Target for outbound-call timing lines.
pub const EXTERNAL_TARGET: &str = "interservice::external";

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().pretty().with_target(true))
            .try_init()?;
    }

    tracing::info!(log_level = %config.log_level, json = config.json, "Logging initialized");
    Ok(())
}
