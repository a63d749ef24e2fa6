//! Provisioning description.
//!
//! # Resources
//! ```text
//! REST API (/ and /{proxy+}, ANY, AWS_PROXY)
//!     → invoke permission
//!     → image-based function (bounded timeout) + execution role
//!     → log group /aws/lambda/<function> (fixed retention)
//!
//! api_key_required:
//!     API key → usage plan (bound to the stage) → output `keyId`
//! ```
//!
//! # Design Decisions
//! - Output is a plain CloudFormation template; nothing here deploys
//! - The adapter behaves identically with or without key enforcement,
//!   since the front door rejects keyless requests before invoking

pub mod stack;

pub use stack::{synthesize, StackConfig, RETENTION_DAYS};
