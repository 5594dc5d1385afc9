//! The `{ data, error }` envelope wrapping every service response.
//!
//! Exactly one side of the envelope is ever exposed: a truthy `error` wins,
//! otherwise `data` is handed out (a missing `data` becomes `null`).

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;

/// Raw service response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub error: Option<Value>,
}

/// Error reported by the service inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError(pub String);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ServiceError {}

impl Envelope {
    /// Parses a raw response body.
    pub fn from_value(raw: Value) -> Result<Self, CoreError> {
        match raw {
            Value::Object(_) => serde_json::from_value(raw)
                .map_err(|err| CoreError::MalformedEnvelope(err.to_string())),
            other => Err(CoreError::MalformedEnvelope(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Unwraps the envelope into its data, or the service error it carries.
    pub fn into_result(self) -> Result<Value, ServiceError> {
        match self.error {
            Some(error) if is_truthy(&error) => Err(ServiceError(error_message(error))),
            _ => Ok(self.data.unwrap_or(Value::Null)),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn error_message(error: Value) -> String {
    match error {
        Value::String(message) => message,
        Value::Object(ref fields) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}
