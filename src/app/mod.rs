//! Application bootstrapping subsystem.
//!
//! # Data Flow
//! ```text
//! Application::build (routes + async initialization)
//!     → pipeline.rs callback (validation options, CORS)
//!     → bootstrap.rs ambient layers (timeout, body limit, request ID, trace)
//!     → Server (dispatchable, shared by invocation and local modes)
//! ```

pub mod bootstrap;
pub mod pipeline;
pub mod validation;

pub use bootstrap::{Application, BootstrapError, Bootstrapper, Server};
pub use pipeline::Pipeline;
pub use validation::{Field, Shape, Validate, Validated, ValidationOptions};
