//! Tolerant field decoders for service payloads.
//!
//! The service is loose about JSON types: a missing value may arrive as
//! `null`, and counters may be encoded as floats (`10.0`). These helpers
//! accept both instead of failing the whole response.

use serde::{Deserialize, Deserializer};
use serde_json::Number;

/// `null` decodes as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn to_i64(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if let Some(value) = number.as_u64() {
        return Some(i64::try_from(value).unwrap_or(i64::MAX));
    }
    let value = number.as_f64()?;
    // Saturating cast; NaN and infinities are not valid JSON numbers
    value.is_finite().then(|| value.round() as i64)
}

/// Non-negative count; `null` is zero, floats are rounded, negatives clamp to zero.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_count(deserializer)?.unwrap_or(0))
}

/// Like [`count`], keeping `null` and absence distinct from zero.
pub(crate) fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number
        .as_ref()
        .and_then(to_i64)
        .map(|value| u64::try_from(value).unwrap_or(0)))
}

/// Signed delta; `null` is zero, floats are rounded.
pub(crate) fn delta<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<Number>::deserialize(deserializer)?;
    Ok(number.as_ref().and_then(to_i64).unwrap_or(0))
}
