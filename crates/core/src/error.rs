//! Decoding errors raised while turning service payloads into typed values.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("failed to decode {what}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes an already-unwrapped `data` payload into `T`.
///
/// `what` names the payload in the error so failures point at the endpoint
/// that produced them.
pub fn decode<T: DeserializeOwned>(value: Value, what: &'static str) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(|source| CoreError::Decode { what, source })
}
