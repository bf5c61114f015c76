//! Response decoding for statically-shaped bodies.
//!
//! The v1 API has no integer type on the wire: counts such as `bytes` or
//! `revision` may arrive as `1024` or `1024.0`. Numbers are accepted in
//! either form and floats are truncated toward zero. Negative, non-finite
//! or out-of-range values are rejected.

use crate::error::{DropboxError, DropboxResult};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a 200 response body into `T`.
///
/// Failures are `Decode` errors tagged with the endpoint, so callers can
/// tell them apart from a non-200 `Transport` error.
pub fn decode_json<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> DropboxResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        let mut err = DropboxError::decode(format!(
            "Failed to parse response from {}: {}",
            endpoint, e
        ))
        .with_endpoint(endpoint);
        err.body = Some(String::from_utf8_lossy(body).into_owned());
        err
    })
}

/// Truncate a wire float toward zero into a `u64`.
pub fn truncate_u64(value: f64) -> Result<u64, String> {
    let t = value.trunc();
    if !t.is_finite() {
        return Err(format!("non-finite number {}", value));
    }
    if t < 0.0 {
        return Err(format!("negative number {}", value));
    }
    // 2^64 is the first float that does not fit.
    if t >= 18_446_744_073_709_551_616.0 {
        return Err(format!("number {} out of range", value));
    }
    Ok(t as u64)
}

/// Convert a JSON number into a `u64`, truncating floats toward zero.
pub fn number_to_u64(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(u)
            } else if let Some(i) = n.as_i64() {
                Err(format!("negative number {}", i))
            } else {
                n.as_f64()
                    .ok_or_else(|| format!("unrepresentable number {}", n))
                    .and_then(truncate_u64)
            }
        }
        other => Err(format!("expected a number, found {}", type_name(other))),
    }
}

/// Convert a JSON number into a `u32`, truncating floats toward zero.
pub fn number_to_u32(value: &Value) -> Result<u32, String> {
    let n = number_to_u64(value)?;
    u32::try_from(n).map_err(|_| format!("number {} out of range", n))
}

/// Short name of a JSON value's type, for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── serde helpers ───────────────────────────────────────────────────

/// `deserialize_with` for `u64` fields that may arrive as floats or null.
pub fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(0),
        Some(v) => number_to_u64(&v).map_err(D::Error::custom),
    }
}

/// `deserialize_with` for `u32` fields that may arrive as floats or null.
pub fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(0),
        Some(v) => number_to_u32(&v).map_err(D::Error::custom),
    }
}

/// `deserialize_with` for bool fields that may arrive as null.
pub fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or_default())
}

/// `deserialize_with` for string fields the server may send as null.
pub fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}
