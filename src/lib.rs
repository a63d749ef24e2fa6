//! Serverless bridge library.
//!
//! Runs an axum application behind function invocations with a cached,
//! build-once server, or on a local port for development.

pub mod adapter;
pub mod app;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provisioning;

pub use adapter::{InvocationAdapter, ProxyReply, ServerCache};
pub use app::{Application, Bootstrapper, Server};
pub use config::BridgeConfig;
pub use http::LocalServer;
pub use lifecycle::Shutdown;
