//! Invocation handling.
//!
//! One call per platform invocation: ensure the server is built, translate
//! the event, dispatch, translate the response. Every failure surfaces as an
//! `AdapterError`; none is turned into a fabricated reply.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;

use crate::adapter::cache::{CacheOutcome, ServerCache};
use crate::adapter::event::{summarize, InvocationContext, ProxyEvent, TranslationError};
use crate::adapter::reply::{ProxyReply, ReplyError};
use crate::app::bootstrap::{Application, BootstrapError, Bootstrapper};

/// Error raised by the completion callback.
#[derive(Debug, Error)]
#[error("completion failed: {0}")]
pub struct DeliveryError(pub String);

/// Reasons an invocation fails.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] ReplyError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("invocation deadline exceeded")]
    DeadlineExceeded,
}

/// Completion mechanism for platforms that signal results through a callback.
pub trait Completion {
    fn complete(self, outcome: Result<&ProxyReply, &AdapterError>) -> Result<(), DeliveryError>;
}

impl<F> Completion for F
where
    F: FnOnce(Result<&ProxyReply, &AdapterError>) -> Result<(), DeliveryError>,
{
    fn complete(self, outcome: Result<&ProxyReply, &AdapterError>) -> Result<(), DeliveryError> {
        self(outcome)
    }
}

/// Bridges platform invocations to a lazily built application.
pub struct InvocationAdapter<A> {
    bootstrapper: Bootstrapper<A>,
    cache: Arc<ServerCache>,
}

impl<A: Application> InvocationAdapter<A> {
    /// Create an adapter with its own cache.
    pub fn new(bootstrapper: Bootstrapper<A>) -> Self {
        Self::with_cache(bootstrapper, Arc::new(ServerCache::new()))
    }

    /// Create an adapter sharing an existing cache.
    pub fn with_cache(bootstrapper: Bootstrapper<A>, cache: Arc<ServerCache>) -> Self {
        Self {
            bootstrapper,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ServerCache> {
        &self.cache
    }

    /// Handle one invocation and return the reply.
    pub async fn handle(
        &self,
        event: Value,
        context: InvocationContext,
    ) -> Result<ProxyReply, AdapterError> {
        let span = tracing::info_span!(
            "invocation",
            request_id = context.request_id.as_deref().unwrap_or("-"),
        );

        let work = self.process(event, context.clone()).instrument(span);
        match context.remaining() {
            Some(remaining) => tokio::time::timeout(remaining, work)
                .await
                .map_err(|_| {
                    tracing::error!(
                        request_id = context.request_id.as_deref().unwrap_or("-"),
                        "Invocation deadline exceeded"
                    );
                    AdapterError::DeadlineExceeded
                })?,
            None => work.await,
        }
    }

    /// Handle one invocation and deliver the outcome through `completion`.
    ///
    /// Returns the same outcome the callback received, or a delivery error
    /// if the callback itself failed.
    pub async fn handle_with_completion<C: Completion>(
        &self,
        event: Value,
        context: InvocationContext,
        completion: C,
    ) -> Result<ProxyReply, AdapterError> {
        let outcome = self.handle(event, context).await;
        completion.complete(outcome.as_ref())?;
        outcome
    }

    async fn process(
        &self,
        event: Value,
        context: InvocationContext,
    ) -> Result<ProxyReply, AdapterError> {
        tracing::debug!(event = %event, "Invocation event");
        let (method, path) = summarize(&event);
        tracing::info!(method = %method, path = %path, "Invocation received");

        let (server, outcome) = self
            .cache
            .get_or_build(|| self.bootstrapper.build())
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Server build failed"))?;

        match outcome {
            CacheOutcome::Built => tracing::info!(
                attempts = self.cache.build_attempts(),
                "Created server (cold start)"
            ),
            CacheOutcome::Cached => tracing::debug!("Using cached server"),
        }

        let request = ProxyEvent::from_value(event)
            .and_then(|event| event.into_request(&context))
            .inspect_err(|e| tracing::error!(error = %e, "Event translation failed"))?;

        let response = server.dispatch(request).await;
        let reply = ProxyReply::from_response(response).await?;

        tracing::info!(status = reply.status_code(), "Invocation completed");
        Ok(reply)
    }
}
