//! Registration with the function runtime.

use std::sync::Arc;

use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;

use crate::adapter::event::InvocationContext;
use crate::adapter::invocation::InvocationAdapter;
use crate::app::bootstrap::Application;

/// Serve invocations until the runtime stops.
///
/// The adapter lives for the whole process, so its cache survives across
/// every invocation the execution environment receives.
pub async fn run<A: Application>(adapter: InvocationAdapter<A>) -> Result<(), lambda_runtime::Error> {
    let adapter = Arc::new(adapter);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let adapter = adapter.clone();
        async move {
            let context = InvocationContext::from(&event.context);
            adapter
                .handle(event.payload, context)
                .await
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
}
