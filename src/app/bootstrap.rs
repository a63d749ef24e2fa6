//! Application bootstrapping.
//!
//! # Responsibilities
//! - Construct the application's route graph and dependencies
//! - Run its asynchronous initialization
//! - Apply the pipeline callback (validation, CORS)
//! - Wrap the result in the ambient layers (timeout, body limit, request ID,
//!   tracing) and hand back a dispatchable `Server`
//!
//! # Design Decisions
//! - Fail fast: any error aborts the build and nothing is returned
//! - Building twice yields two independent servers; callers cache the result

use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request, Response},
    Router,
};
use thiserror::Error;
use tower::ServiceExt;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::adapter::event::InvocationContext;
use crate::app::pipeline::Pipeline;
use crate::config::{PipelineConfig, TimeoutConfig};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Errors that abort application startup.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    /// The application could not construct its dependency graph.
    #[error("application build failed: {0}")]
    Application(String),

    /// The pipeline callback rejected its configuration.
    #[error("pipeline configuration failed: {0}")]
    Pipeline(String),

    /// A resource needed during initialization is unavailable.
    #[error("resource unavailable: {0}")]
    Resource(String),
}

/// An HTTP application that can be bootstrapped.
pub trait Application: Send + Sync + 'static {
    /// Construct the route graph and run any asynchronous initialization.
    fn build(&self) -> impl Future<Output = Result<Router, BootstrapError>> + Send;
}

/// A fully initialized application ready to accept requests.
#[derive(Clone)]
pub struct Server {
    router: Router,
}

impl Server {
    /// Dispatch a single request through the application.
    pub async fn dispatch(&self, request: Request<Body>) -> Response<Body> {
        let result: Result<Response<Body>, Infallible> = self.router.clone().oneshot(request).await;
        match result {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// The underlying router, for serving on a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server").finish_non_exhaustive()
    }
}

/// Builds servers from an application and a pipeline.
pub struct Bootstrapper<A> {
    app: A,
    pipeline: Pipeline,
    timeouts: TimeoutConfig,
    body_limit_bytes: usize,
}

impl<A: Application> Bootstrapper<A> {
    /// Create a new bootstrapper.
    pub fn new(app: A, pipeline: Pipeline) -> Self {
        Self {
            app,
            pipeline,
            timeouts: TimeoutConfig::default(),
            body_limit_bytes: PipelineConfig::default().body_limit_bytes,
        }
    }

    /// Override the request timeout.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Override the request body limit.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }

    /// The wrapped application.
    pub fn app(&self) -> &A {
        &self.app
    }

    /// Build and initialize a server.
    pub async fn build(&self) -> Result<Server, BootstrapError> {
        let router = self.app.build().await?;
        let router = (self.pipeline)(router)?;

        tracing::debug!(
            request_timeout_secs = self.timeouts.request_secs,
            body_limit_bytes = self.body_limit_bytes,
            "Application initialized"
        );

        Ok(Server {
            router: Self::apply_layers(router, &self.timeouts, self.body_limit_bytes),
        })
    }

    #[allow(deprecated)]
    fn apply_layers(router: Router, timeouts: &TimeoutConfig, body_limit_bytes: usize) -> Router {
        router
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(body_limit_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(InvocationRequestId))
    }
}

/// Request ID source: the platform request id when the request came from an
/// invocation, a UUID v4 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationRequestId;

impl MakeRequestId for InvocationRequestId {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<RequestId> {
        let id = request
            .extensions()
            .get::<InvocationContext>()
            .and_then(|ctx| ctx.request_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
