//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::app::validation::ValidationOptions;
use crate::provisioning::StackConfig;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// How the application is exposed (platform invocations or a local port).
    pub mode: RunMode,

    /// Local development listener.
    pub local: LocalConfig,

    /// Request pipeline applied once at bootstrap.
    pub pipeline: PipelineConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Demo catalog application settings.
    pub catalog: CatalogConfig,

    /// Cloud resources fronting the function.
    pub stack: StackConfig,
}

impl BridgeConfig {
    /// Apply environment overrides.
    ///
    /// `APP_ENV=local` selects local mode and `PORT` replaces the port of the
    /// local bind address.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("APP_ENV").ok().as_deref(),
            std::env::var("PORT").ok().as_deref(),
        );
    }

    fn apply_overrides(&mut self, app_env: Option<&str>, port: Option<&str>) {
        if app_env.is_some_and(|env| env.eq_ignore_ascii_case("local")) {
            self.mode = RunMode::Local;
        }

        if let Some(port) = port {
            let host = self
                .local
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            self.local.bind_address = format!("{}:{}", host, port);
        }
    }
}

/// Execution mode of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Served through function invocations with a cached application.
    #[default]
    Invocation,
    /// Served on a directly addressable port; no event translation.
    Local,
}

/// Local listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Pipeline configuration applied to the application at bootstrap.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Request payload validation.
    pub validation: ValidationOptions,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Maximum request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationOptions::default(),
            cors: CorsConfig::default(),
            // Matches the 6MB synchronous invocation payload ceiling.
            body_limit_bytes: 6 * 1024 * 1024,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable the CORS layer.
    pub enabled: bool,

    /// Allowed origins; `"*"` allows every origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers; `"*"` allows any header.
    pub allowed_headers: Vec<String>,

    /// Preflight cache duration in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["*".to_string()],
            max_age_secs: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Demo catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON file with items loaded during application build.
    pub seed_path: Option<PathBuf>,
}
