//! Invocation adapter subsystem.
//!
//! # Data Flow
//! ```text
//! platform invocation (event JSON + context)
//!     → invocation.rs (log, deadline, orchestration)
//!     → cache.rs (single-flight build of the Server, reused afterwards)
//!     → event.rs (ProxyEvent → http::Request)
//!     → Server::dispatch (the bootstrapped application)
//!     → reply.rs (http::Response → ProxyReply)
//!     → returned to the runtime (runtime.rs) or a completion callback
//! ```
//!
//! # Design Decisions
//! - The cache is an injectable object rather than a global so tests can
//!   substitute or reset it
//! - Application error responses pass through untouched; only failures to
//!   produce a response at all become invocation errors

pub mod cache;
pub mod event;
pub mod invocation;
pub mod reply;
pub mod runtime;

pub use cache::{CacheOutcome, CacheState, ServerCache};
pub use event::{InvocationContext, ProxyEvent, RawHeaders, RequestContext, TranslationError};
pub use invocation::{AdapterError, Completion, DeliveryError, InvocationAdapter};
pub use reply::ProxyReply;
