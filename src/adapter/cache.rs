//! Cached server handle.
//!
//! # States
//! ```text
//! Uninitialized → Initializing → Ready
//!       ↑               │
//!       └── failure / cancellation
//! ```
//!
//! # Design Decisions
//! - The build is single-flight: concurrent callers wait on the one
//!   in-flight build and then share its result
//! - A failed or dropped build commits nothing, so the next caller retries
//! - Reads after `Ready` take no lock

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::app::bootstrap::{BootstrapError, Server};

/// Observable status of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Which path produced the handle for an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// This caller ran the build.
    Built,
    /// The handle already existed or another caller built it.
    Cached,
}

/// Process-lifetime holder of the initialized server.
#[derive(Debug, Default)]
pub struct ServerCache {
    cell: OnceCell<Arc<Server>>,
    initializing: AtomicBool,
    attempts: AtomicUsize,
}

impl ServerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached server, building it if no build has succeeded yet.
    pub async fn get_or_build<F, Fut>(
        &self,
        build: F,
    ) -> Result<(Arc<Server>, CacheOutcome), BootstrapError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Server, BootstrapError>>,
    {
        if let Some(server) = self.cell.get() {
            return Ok((server.clone(), CacheOutcome::Cached));
        }

        let mut built = false;
        let server = self
            .cell
            .get_or_try_init(|| async {
                let _guard = InitializingGuard::enter(&self.initializing);
                self.attempts.fetch_add(1, Ordering::SeqCst);
                let server = build().await?;
                built = true;
                Ok::<_, BootstrapError>(Arc::new(server))
            })
            .await?
            .clone();

        let outcome = if built {
            CacheOutcome::Built
        } else {
            CacheOutcome::Cached
        };
        Ok((server, outcome))
    }

    /// The cached server, if ready.
    pub fn get(&self) -> Option<Arc<Server>> {
        self.cell.get().cloned()
    }

    pub fn state(&self) -> CacheState {
        if self.cell.initialized() {
            CacheState::Ready
        } else if self.initializing.load(Ordering::SeqCst) {
            CacheState::Initializing
        } else {
            CacheState::Uninitialized
        }
    }

    /// Number of builds started, including failed and abandoned ones.
    pub fn build_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Drop the cached server. Requires exclusive access, so no invocation
    /// can be in flight.
    pub fn reset(&mut self) {
        self.cell.take();
        *self.initializing.get_mut() = false;
    }
}

/// Marks the cache as initializing for the guard's lifetime, including when
/// the build future is dropped mid-flight.
struct InitializingGuard<'a>(&'a AtomicBool);

impl<'a> InitializingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
