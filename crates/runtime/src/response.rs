//! Response normalization.
//!
//! Every queued request ends here before its domain completion sees it.
//! Transport failures pass through untouched; otherwise the body is read as
//! a `{ data, error }` envelope, and exactly one of the two is exposed.

use serde::de::DeserializeOwned;
use serde_json::Value;

use behave_core::{Envelope, decode};
use behave_transport::TransportError;

use crate::api::{Result, SdkError};

/// Unwraps the envelope of a raw transport outcome.
pub fn normalize(outcome: std::result::Result<Value, TransportError>) -> Result<Value> {
    // A transport error carries no body, so it must short-circuit first
    let raw = outcome?;
    Envelope::from_value(raw)?
        .into_result()
        .map_err(SdkError::from)
}

/// Normalizes and decodes the `data` section into `T`.
pub fn normalize_into<T: DeserializeOwned>(
    outcome: std::result::Result<Value, TransportError>,
    what: &'static str,
) -> Result<T> {
    let data = normalize(outcome)?;
    Ok(decode(data, what)?)
}
