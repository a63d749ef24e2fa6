//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → TraceLayer spans around every dispatched request
//!
//! Consumers:
//!     → stdout (collected by the platform log group or the terminal)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Request ID flows from the invocation context into every request span

pub mod logging;

pub use logging::{init_logging, LoggingError};
