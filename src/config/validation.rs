//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check CORS values parse as header values and methods
//! - Delegate stack checks to the provisioning module
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.local.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "local.bind_address",
            format!("'{}' is not a socket address", config.local.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.pipeline.body_limit_bytes == 0 {
        errors.push(ValidationError::new(
            "pipeline.body_limit_bytes",
            "must be greater than 0",
        ));
    }

    let cors = &config.pipeline.cors;
    for origin in &cors.allowed_origins {
        if origin != "*" && HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "pipeline.cors.allowed_origins",
                format!("'{}' is not a valid origin", origin),
            ));
        }
    }
    for method in &cors.allowed_methods {
        if method != "*" && Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "pipeline.cors.allowed_methods",
                format!("'{}' is not a valid method", method),
            ));
        }
    }
    for header in &cors.allowed_headers {
        if header != "*" && HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "pipeline.cors.allowed_headers",
                format!("'{}' is not a valid header name", header),
            ));
        }
    }

    if tracing_level_is_unknown(&config.observability.log_level) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    errors.extend(config.stack.validate());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn tracing_level_is_unknown(level: &str) -> bool {
    level.parse::<tracing::Level>().is_err()
}
