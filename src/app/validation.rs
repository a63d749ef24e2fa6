//! Request payload validation.
//!
//! Handlers take `Validated<T>` instead of `Json<T>`. The options installed
//! by the pipeline decide how unknown properties and string-encoded scalars
//! are treated before `T` is deserialized and its own rules run.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Options controlling the `Validated` extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Remove properties the payload type does not declare.
    pub strip_unknown: bool,

    /// Convert string-encoded scalars into the declared field shape.
    pub coerce: bool,

    /// Reject payloads carrying undeclared properties.
    pub reject_unknown: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strip_unknown: true,
            coerce: true,
            reject_unknown: true,
        }
    }
}

/// Declared shape of a payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    Integer,
    Number,
    Boolean,
    Any,
}

/// A field accepted in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
}

impl Field {
    pub const fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, Shape::Text)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, Shape::Integer)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, Shape::Number)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, Shape::Boolean)
    }
}

/// A payload type with declared fields and semantic rules.
pub trait Validate {
    /// Every property the payload accepts.
    const FIELDS: &'static [Field];

    /// Semantic checks run after deserialization. Returns one message per
    /// violated rule.
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Rejection produced by `Validated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRejection {
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ValidationRejection {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            messages: vec![message.into()],
        }
    }

    fn unprocessable(messages: Vec<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            messages,
        }
    }
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "statusCode": self.status.as_u16(),
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.messages,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Extractor yielding a payload that passed validation.
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

impl<T, S> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let options = req
            .extensions()
            .get::<ValidationOptions>()
            .copied()
            .unwrap_or_default();

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ValidationRejection::bad_request(rejection.body_text()))?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ValidationRejection::bad_request(format!("malformed JSON: {}", e)))?;

        validate_value::<T>(value, options).map(Validated)
    }
}

/// Apply the validation options to a parsed payload and produce `T`.
pub fn validate_value<T>(value: Value, options: ValidationOptions) -> Result<T, ValidationRejection>
where
    T: DeserializeOwned + Validate,
{
    let Value::Object(mut object) = value else {
        return Err(ValidationRejection::unprocessable(vec![
            "payload must be a JSON object".to_string(),
        ]));
    };

    let unknown: Vec<String> = object
        .keys()
        .filter(|key| !T::FIELDS.iter().any(|field| field.name == key.as_str()))
        .cloned()
        .collect();

    if !unknown.is_empty() {
        if options.reject_unknown {
            return Err(ValidationRejection::unprocessable(
                unknown
                    .iter()
                    .map(|key| format!("property {} should not exist", key))
                    .collect(),
            ));
        }
        if options.strip_unknown {
            for key in &unknown {
                object.remove(key);
            }
        }
    }

    if options.coerce {
        coerce_fields(&mut object, T::FIELDS);
    }

    let payload: T = serde_json::from_value(Value::Object(object))
        .map_err(|e| ValidationRejection::unprocessable(vec![e.to_string()]))?;

    let violations = payload.validate();
    if violations.is_empty() {
        Ok(payload)
    } else {
        Err(ValidationRejection::unprocessable(violations))
    }
}

fn coerce_fields(object: &mut Map<String, Value>, fields: &[Field]) {
    for field in fields {
        let Some(Value::String(raw)) = object.get(field.name) else {
            continue;
        };
        let raw = raw.trim();

        let coerced = match field.shape {
            Shape::Integer => raw.parse::<i64>().ok().map(Value::from),
            Shape::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Shape::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            Shape::Text | Shape::Any => None,
        };

        if let Some(coerced) = coerced {
            object.insert(field.name.to_string(), coerced);
        }
    }
}
