//! Outbound reply translation.
//!
//! Status, headers and body are copied as the application produced them.
//! Bodies that are not valid UTF-8, or that carry a `content-encoding`, are
//! sent as binary, which the envelope serializes as base64 and flags so the
//! front door decodes them.

use aws_lambda_events::encodings::Body as ReplyBody;
use aws_lambda_events::event::apigw::ApiGatewayProxyResponse;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_ENCODING, HeaderMap, Response},
};
use serde::Serialize;

/// Largest body a synchronous invocation may return.
pub const MAX_REPLY_BYTES: usize = 6 * 1024 * 1024;

/// Reply envelope returned to the platform.
///
/// `headers` holds the last value per name, `multiValueHeaders` every value
/// in order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProxyReply(ApiGatewayProxyResponse);

/// Failure to read the application's response.
#[derive(Debug, thiserror::Error)]
#[error("failed to read response body: {0}")]
pub struct ReplyError(#[source] pub axum::Error);

impl ProxyReply {
    /// Translate an application response.
    pub async fn from_response(response: Response<Body>) -> Result<Self, ReplyError> {
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, MAX_REPLY_BYTES).await.map_err(ReplyError)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &parts.headers {
            headers.insert(name.clone(), value.clone());
        }

        let encoded = parts.headers.contains_key(CONTENT_ENCODING);
        let (body, is_base64_encoded) = match std::str::from_utf8(&bytes) {
            Ok(text) if !encoded => (ReplyBody::Text(text.to_string()), false),
            _ => (ReplyBody::Binary(bytes.to_vec()), true),
        };

        let mut reply = ApiGatewayProxyResponse::default();
        reply.status_code = i64::from(parts.status.as_u16());
        reply.headers = headers;
        reply.multi_value_headers = parts.headers;
        reply.body = Some(body);
        reply.is_base64_encoded = is_base64_encoded;
        Ok(Self(reply))
    }

    pub fn status_code(&self) -> i64 {
        self.0.status_code
    }

    /// Single value of a header, by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.0.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a header, in order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.0
            .multi_value_headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The body when it was sent as text.
    pub fn body_text(&self) -> Option<&str> {
        match &self.0.body {
            Some(ReplyBody::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_base64_encoded(&self) -> bool {
        self.0.is_base64_encoded
    }
}
