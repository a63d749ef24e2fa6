//! End-to-end invocation tests: cold start, reuse, translation and failure
//! propagation through the adapter.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use serde_json::{json, Value};

use common::{context_with_deadline, rest_event, TestApp};
use serverless_bridge::adapter::{
    AdapterError, CacheState, DeliveryError, InvocationAdapter, InvocationContext, ProxyReply,
    ServerCache, TranslationError,
};
use serverless_bridge::app::{pipeline, BootstrapError, Bootstrapper};

fn adapter(app: &TestApp) -> InvocationAdapter<TestApp> {
    InvocationAdapter::new(Bootstrapper::new(app.clone(), pipeline::passthrough()))
}

#[tokio::test]
async fn test_builds_once_across_invocations() {
    let app = TestApp::default();
    let adapter = adapter(&app);
    assert_eq!(adapter.cache().state(), CacheState::Uninitialized);

    adapter
        .handle(rest_event("GET", "/items/1"), InvocationContext::default())
        .await
        .unwrap();
    let first = adapter.cache().get().unwrap();

    for id in 2..=5 {
        let reply = adapter
            .handle(rest_event("GET", &format!("/items/{}", id)), InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(reply.status_code(), 200);
    }

    let last = adapter.cache().get().unwrap();
    assert!(Arc::ptr_eq(&first, &last));
    assert_eq!(app.build_count(), 1);
    assert_eq!(adapter.cache().build_attempts(), 1);
    assert_eq!(adapter.cache().state(), CacheState::Ready);
}

#[tokio::test]
async fn test_adapters_sharing_a_cache_build_once() {
    let app = TestApp::default();
    let cache = Arc::new(ServerCache::new());
    let first = InvocationAdapter::with_cache(
        Bootstrapper::new(app.clone(), pipeline::passthrough()),
        cache.clone(),
    );
    let second = InvocationAdapter::with_cache(
        Bootstrapper::new(app.clone(), pipeline::passthrough()),
        cache.clone(),
    );

    first
        .handle(rest_event("GET", "/items/1"), InvocationContext::default())
        .await
        .unwrap();
    second
        .handle(rest_event("GET", "/items/2"), InvocationContext::default())
        .await
        .unwrap();

    assert_eq!(app.build_count(), 1);
    assert!(Arc::ptr_eq(first.cache(), second.cache()));
}

#[tokio::test]
async fn test_failed_build_is_retried_on_next_invocation() {
    let app = TestApp::failing(1);
    let adapter = adapter(&app);

    let err = adapter
        .handle(rest_event("GET", "/items/1"), InvocationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Bootstrap(BootstrapError::Resource(_))));
    assert_eq!(adapter.cache().state(), CacheState::Uninitialized);
    assert!(adapter.cache().get().is_none());

    let reply = adapter
        .handle(rest_event("GET", "/items/1"), InvocationContext::default())
        .await
        .unwrap();
    assert_eq!(reply.status_code(), 200);
    assert_eq!(app.build_count(), 2);
    assert_eq!(adapter.cache().state(), CacheState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cold_invocations_share_one_build() {
    let app = TestApp::slow(Duration::from_millis(100));
    let adapter = Arc::new(adapter(&app));

    let handles: Vec<_> = (1..=8)
        .map(|id| {
            let adapter = adapter.clone();
            tokio::spawn(async move {
                adapter
                    .handle(rest_event("GET", &format!("/items/{}", id)), InvocationContext::default())
                    .await
            })
        })
        .collect();

    for handle in handles {
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.status_code(), 200);
    }

    assert_eq!(app.build_count(), 1);
    assert_eq!(adapter.cache().build_attempts(), 1);
}

#[tokio::test]
async fn test_request_translation_preserves_request() {
    let adapter = adapter(&TestApp::default());

    let mut event = rest_event("GET", "/echo");
    event["headers"] = json!({ "X-Test": "abc" });
    event["queryStringParameters"] = json!({ "page": "2" });

    let reply = adapter
        .handle(event, InvocationContext::default())
        .await
        .unwrap();
    assert_eq!(reply.status_code(), 200);
    assert!(!reply.is_base64_encoded());

    let seen: Value = serde_json::from_str(reply.body_text().unwrap()).unwrap();
    assert_eq!(seen["method"], "GET");
    assert_eq!(seen["path"], "/echo");
    assert_eq!(seen["query"], "page=2");
    assert_eq!(seen["x_test"], "abc");
    assert_eq!(seen["raw_x_test"], json!(["abc"]));
    assert_eq!(seen["stage"], "prod");
    assert_eq!(seen["invocation"], true);
}

#[tokio::test]
async fn test_response_translation_preserves_status_and_body() {
    let adapter = adapter(&TestApp::default());

    let reply = adapter
        .handle(rest_event("GET", "/items/42"), context_with_deadline(Duration::from_secs(30)))
        .await
        .unwrap();

    assert_eq!(reply.status_code(), 200);
    assert_eq!(reply.body_text(), Some(r#"{"id":42}"#));
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert_eq!(
        reply.header("x-request-id"),
        Some("8476a536-e9f4-11e8-9739-2dfe598c3fcd")
    );
}

#[tokio::test]
async fn test_decoded_paths_reach_the_application() {
    let adapter = adapter(&TestApp::default());

    for (path, name) in [("/greet/hello world", "hello world"), ("/greet/zoë", "zoë")] {
        let reply = adapter
            .handle(rest_event("GET", path), InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(reply.status_code(), 200);

        let body: Value = serde_json::from_str(reply.body_text().unwrap()).unwrap();
        assert_eq!(body["name"], name);
    }
}

#[tokio::test]
async fn test_application_error_response_passes_through() {
    let app = TestApp::default();
    let adapter = adapter(&app);
    let payload = r#"{"name":"gear","color":"red"}"#;

    let mut event = rest_event("POST", "/widgets");
    event["headers"] = json!({ "Content-Type": "application/json" });
    event["body"] = json!(payload);

    let reply = adapter
        .handle(event, InvocationContext::default())
        .await
        .unwrap();

    let direct = Bootstrapper::new(app.clone(), pipeline::passthrough())
        .build()
        .await
        .unwrap()
        .dispatch(
            Request::post("/widgets")
                .header("content-type", "application/json")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await;
    let direct_status = i64::from(direct.status().as_u16());
    let direct_body = axum::body::to_bytes(direct.into_body(), usize::MAX)
        .await
        .unwrap();

    assert_eq!(reply.status_code(), 422);
    assert_eq!(reply.status_code(), direct_status);
    assert_eq!(reply.body_text().unwrap().as_bytes(), &direct_body[..]);

    let body: Value = serde_json::from_str(reply.body_text().unwrap()).unwrap();
    assert_eq!(body["message"], json!(["property color should not exist"]));
}

#[tokio::test]
async fn test_unknown_route_is_a_reply_not_an_error() {
    let adapter = adapter(&TestApp::default());

    let reply = adapter
        .handle(rest_event("GET", "/missing"), InvocationContext::default())
        .await
        .unwrap();
    assert_eq!(reply.status_code(), 404);
}

#[tokio::test]
async fn test_malformed_event_is_rejected() {
    let adapter = adapter(&TestApp::default());

    let err = adapter
        .handle(json!({ "path": "/items/1" }), InvocationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Translation(TranslationError::MissingField(_))
    ));

    let err = adapter
        .handle(json!("GET /items/1"), InvocationContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Translation(TranslationError::NotAnObject)));

    // The server was still built and stays cached.
    assert_eq!(adapter.cache().state(), CacheState::Ready);
}

#[tokio::test]
async fn test_deadline_abandons_build_and_next_invocation_retries() {
    let app = TestApp::slow(Duration::from_millis(300));
    let adapter = adapter(&app);

    let err = adapter
        .handle(
            rest_event("GET", "/items/1"),
            context_with_deadline(Duration::from_millis(30)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::DeadlineExceeded));
    assert_eq!(adapter.cache().state(), CacheState::Uninitialized);

    let reply = adapter
        .handle(rest_event("GET", "/items/1"), InvocationContext::default())
        .await
        .unwrap();
    assert_eq!(reply.status_code(), 200);
    assert_eq!(app.build_count(), 2);
}

#[tokio::test]
async fn test_completion_receives_outcome() {
    let adapter = adapter(&TestApp::default());
    let delivered = Arc::new(Mutex::new(None));

    let sink = delivered.clone();
    let reply = adapter
        .handle_with_completion(
            rest_event("GET", "/items/7"),
            InvocationContext::default(),
            move |outcome: Result<&ProxyReply, &AdapterError>| {
                *sink.lock().unwrap() = outcome.ok().map(|reply| reply.status_code());
                Ok(())
            },
        )
        .await
        .unwrap();

    assert_eq!(reply.status_code(), 200);
    assert_eq!(*delivered.lock().unwrap(), Some(200));
}

#[tokio::test]
async fn test_completion_receives_failure() {
    let adapter = adapter(&TestApp::failing(1));
    let delivered = Arc::new(Mutex::new(None));

    let sink = delivered.clone();
    let result = adapter
        .handle_with_completion(
            rest_event("GET", "/items/7"),
            InvocationContext::default(),
            move |outcome: Result<&ProxyReply, &AdapterError>| {
                *sink.lock().unwrap() = outcome.err().map(|e| e.to_string());
                Ok(())
            },
        )
        .await;

    assert!(matches!(result, Err(AdapterError::Bootstrap(_))));
    assert!(delivered.lock().unwrap().is_some());
}

#[tokio::test]
async fn test_completion_failure_is_reported() {
    let adapter = adapter(&TestApp::default());

    let err = adapter
        .handle_with_completion(
            rest_event("GET", "/items/7"),
            InvocationContext::default(),
            |_: Result<&ProxyReply, &AdapterError>| {
                Err(DeliveryError("callback closed".into()))
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Delivery(_)));
}
