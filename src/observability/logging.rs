//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config and environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for log aggregation, text format for development
//! - `RUST_LOG` overrides the configured level
//! - No ANSI colors or timestamps under invocation mode; the platform log
//!   sink stamps every line itself

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig, RunMode};

/// Logging initialization failure.
#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggingError(#[from] tracing_subscriber::util::TryInitError);

/// Default filter directives for a configured level.
pub fn default_directives(level: &str) -> String {
    format!("serverless_bridge={level},tower_http={level},lambda_runtime=info")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig, mode: RunMode) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let interactive = mode == RunMode::Local;

    match (config.format, interactive) {
        (LogFormat::Json, _) => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?,
        (LogFormat::Text, true) => registry.with(fmt::layer()).try_init()?,
        (LogFormat::Text, false) => registry
            .with(fmt::layer().with_ansi(false).without_time())
            .try_init()?,
    }

    Ok(())
}
