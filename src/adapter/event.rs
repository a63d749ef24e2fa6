//! Inbound event translation.
//!
//! # Responsibilities
//! - Check the fields a REST API proxy event cannot do without, then parse
//!   it into `ApiGatewayProxyRequest`
//! - Build the HTTP request the application sees, header values and
//!   multiplicity untouched
//! - Re-encode the decoded `path` the front door delivers
//!
//! # Design Decisions
//! - Required fields are checked on the raw payload so a missing method or
//!   path is reported as such instead of being defaulted
//! - `http::HeaderMap` normalizes names to lowercase, so the names exactly as
//!   received travel alongside in the `RawHeaders` extension
//! - `multiValueHeaders` wins over `headers` when both carry a name; the
//!   front door fills both and the multi-value map is the complete one
//! - `requestContext` is opaque and passed through as `RequestContext`

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, Uri},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};
use thiserror::Error;
use url::{Position, Url};

/// Errors raised while turning an event into a request.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The event is not a structurally valid proxy event.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload is not a JSON object.
    #[error("event payload must be a JSON object")]
    NotAnObject,

    /// A required field is absent or null.
    #[error("event is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid request path '{0}'")]
    InvalidPath(String),

    #[error("invalid body: {0}")]
    InvalidBody(String),
}

/// A REST API proxy event that carries a method and a path.
#[derive(Debug, Clone)]
pub struct ProxyEvent {
    request: ApiGatewayProxyRequest,
    raw_headers: RawHeaders,
    request_context: Option<Value>,
}

/// Platform metadata about the current invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    /// Platform-assigned request id.
    pub request_id: Option<String>,
    /// Deadline in milliseconds since the Unix epoch.
    pub deadline_ms: Option<u64>,
    pub function_arn: Option<String>,
    pub trace_id: Option<String>,
}

impl InvocationContext {
    /// Time left before the platform abandons the invocation.
    pub fn remaining(&self) -> Option<Duration> {
        let deadline = UNIX_EPOCH + Duration::from_millis(self.deadline_ms?);
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}

impl From<&lambda_runtime::Context> for InvocationContext {
    fn from(ctx: &lambda_runtime::Context) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            request_id: non_empty(&ctx.request_id),
            deadline_ms: (ctx.deadline > 0).then_some(ctx.deadline),
            function_arn: non_empty(&ctx.invoked_function_arn),
            trace_id: ctx.xray_trace_id.clone(),
        }
    }
}


/// Header names and values exactly as received, in arrival order per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders(pub Vec<(String, String)>);

impl RawHeaders {
    /// Values for a name compared case-sensitively.
    pub fn get_exact(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn from_event(event: &Map<String, Value>) -> Self {
        let mut merged: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for key in ["headers", "multiValueHeaders"] {
            if let Some(Value::Object(headers)) = event.get(key) {
                for (name, value) in headers {
                    merged.insert(name.as_str(), header_values(value));
                }
            }
        }

        RawHeaders(
            merged
                .into_iter()
                .flat_map(|(name, values)| values.into_iter().map(move |v| (name.to_string(), v)))
                .collect(),
        )
    }
}

fn header_values(value: &Value) -> Vec<String> {
    match value {
        Value::String(value) => vec![value.clone()],
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Method and path of a raw event, for logging before it is parsed.
pub fn summarize(event: &Value) -> (String, String) {
    let field = |name: &str| {
        event
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    };
    (field("httpMethod"), field("path"))
}

/// The event's `requestContext`, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext(pub Value);

impl ProxyEvent {
    /// Parse a raw invocation payload.
    pub fn from_value(value: Value) -> Result<Self, TranslationError> {
        let Value::Object(mut event) = value else {
            return Err(TranslationError::NotAnObject);
        };

        if let Some(method) = required(&event, "httpMethod")?.as_str() {
            Method::from_bytes(method.as_bytes())
                .map_err(|_| TranslationError::InvalidMethod(method.to_string()))?;
        }
        required(&event, "path")?;

        let raw_headers = RawHeaders::from_event(&event);
        let request_context = event
            .remove("requestContext")
            .filter(|context| !context.is_null());
        let request = serde_json::from_value(Value::Object(event))?;

        Ok(Self {
            request,
            raw_headers,
            request_context,
        })
    }

    /// Build the HTTP request the application will see.
    pub fn into_request(self, context: &InvocationContext) -> Result<Request<Body>, TranslationError> {
        let uri = self.target()?;
        let ApiGatewayProxyRequest {
            http_method,
            headers: single_value_headers,
            multi_value_headers,
            body,
            is_base64_encoded,
            ..
        } = self.request;

        let mut headers: HeaderMap = multi_value_headers;
        for name in single_value_headers.keys() {
            if headers.contains_key(name) {
                continue;
            }
            for value in single_value_headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        let body = match body {
            None => Body::empty(),
            Some(body) if is_base64_encoded => Body::from(
                STANDARD
                    .decode(body.as_bytes())
                    .map_err(|e| TranslationError::InvalidBody(e.to_string()))?,
            ),
            Some(body) => Body::from(body),
        };

        let mut request = Request::new(body);
        *request.method_mut() = http_method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;

        let extensions = request.extensions_mut();
        extensions.insert(self.raw_headers);
        extensions.insert(context.clone());
        if let Some(request_context) = self.request_context {
            extensions.insert(RequestContext(request_context));
        }

        Ok(request)
    }

    /// Path and query as an origin-form URI. The front door hands over the
    /// decoded path, so every segment is percent-encoded again.
    fn target(&self) -> Result<Uri, TranslationError> {
        let path = self
            .request
            .path
            .as_deref()
            .ok_or(TranslationError::MissingField("path"))?;
        if !path.starts_with('/') {
            return Err(TranslationError::InvalidPath(path.to_string()));
        }

        let mut url = Url::parse("http://localhost")
            .map_err(|e| TranslationError::InvalidPath(e.to_string()))?;
        url.set_path(path);

        let pairs = self.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }

        url[Position::BeforePath..]
            .parse()
            .map_err(|_| TranslationError::InvalidPath(path.to_string()))
    }

    /// Query parameters ordered by name, values in arrival order. The
    /// multi-value map is complete when present.
    fn query_pairs(&self) -> Vec<(&str, &str)> {
        let params = if self.request.multi_value_query_string_parameters.is_empty() {
            &self.request.query_string_parameters
        } else {
            &self.request.multi_value_query_string_parameters
        };

        let mut pairs: Vec<(&str, &str)> = params.iter().collect();
        pairs.sort_by_key(|(key, _)| *key);
        pairs
    }
}

fn required<'a>(event: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, TranslationError> {
    match event.get(name) {
        None | Some(Value::Null) => Err(TranslationError::MissingField(name)),
        Some(value) => Ok(value),
    }
}
