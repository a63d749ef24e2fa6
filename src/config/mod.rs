//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (APP_ENV / PORT overrides)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; an execution environment never reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    BridgeConfig, CatalogConfig, CorsConfig, LocalConfig, LogFormat, ObservabilityConfig,
    PipelineConfig, RunMode, TimeoutConfig,
};
pub use validation::ValidationError;
