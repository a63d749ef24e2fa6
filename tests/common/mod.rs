//! Shared fixtures for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::Path,
    http::{HeaderMap, Request},
    routing::{get, post},
    body::Body,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use serverless_bridge::adapter::{InvocationContext, RawHeaders, RequestContext};
use serverless_bridge::app::{Application, BootstrapError, Field, Validate, Validated};

/// Application that counts builds and can be told to fail or stall.
#[derive(Clone, Default)]
pub struct TestApp {
    pub builds: Arc<AtomicUsize>,
    pub failures_left: Arc<AtomicUsize>,
    pub build_delay: Duration,
}

#[allow(dead_code)]
impl TestApp {
    pub fn failing(times: usize) -> Self {
        let app = Self::default();
        app.failures_left.store(times, Ordering::SeqCst);
        app
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            build_delay: delay,
            ..Self::default()
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl Application for TestApp {
    async fn build(&self) -> Result<Router, BootstrapError> {
        self.builds.fetch_add(1, Ordering::SeqCst);

        if !self.build_delay.is_zero() {
            tokio::time::sleep(self.build_delay).await;
        }

        if self.failures_left.load(Ordering::SeqCst) > 0 {
            self.failures_left.fetch_sub(1, Ordering::SeqCst);
            return Err(BootstrapError::Resource("database unavailable".into()));
        }

        Ok(Router::new()
            .route("/items/{id}", get(get_item))
            .route("/greet/{name}", get(greet))
            .route("/echo", get(echo))
            .route("/widgets", post(create_widget)))
    }
}

async fn get_item(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "id": id }))
}

async fn greet(Path(name): Path<String>) -> Json<Value> {
    Json(json!({ "name": name }))
}

async fn echo(headers: HeaderMap, request: Request<Body>) -> Json<Value> {
    let raw = request.extensions().get::<RawHeaders>();
    Json(json!({
        "method": request.method().as_str(),
        "path": request.uri().path(),
        "query": request.uri().query(),
        "x_test": headers.get("x-test").and_then(|v| v.to_str().ok()),
        "raw_x_test": raw.map(|raw| raw.get_exact("X-Test")),
        "stage": request
            .extensions()
            .get::<RequestContext>()
            .map(|ctx| ctx.0["stage"].clone()),
        "invocation": request.extensions().get::<InvocationContext>().is_some(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct Widget {
    pub name: String,
}

impl Validate for Widget {
    const FIELDS: &'static [Field] = &[Field::text("name")];
}

async fn create_widget(Validated(widget): Validated<Widget>) -> Json<Value> {
    Json(json!({ "name": widget.name }))
}

/// A REST proxy event.
#[allow(dead_code)]
pub fn rest_event(method: &str, path: &str) -> Value {
    json!({
        "httpMethod": method,
        "path": path,
        "headers": {},
        "multiValueHeaders": null,
        "queryStringParameters": null,
        "requestContext": { "stage": "prod" },
        "body": null,
        "isBase64Encoded": false
    })
}

/// Context whose deadline is `after` from now.
#[allow(dead_code)]
pub fn context_with_deadline(after: Duration) -> InvocationContext {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    InvocationContext {
        request_id: Some("8476a536-e9f4-11e8-9739-2dfe598c3fcd".into()),
        deadline_ms: Some((now + after).as_millis() as u64),
        ..InvocationContext::default()
    }
}
