//! HTTP serving for local mode.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve over the bootstrapped Server)
//!     → Server's layers and routes, exactly as under invocation mode
//!     → Send to client
//! ```

pub mod server;

pub use server::LocalServer;
