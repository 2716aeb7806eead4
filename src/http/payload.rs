//! Request payload flattening

use serde::Serialize;
use serde_json::Value;

use crate::error::AiError;

/// Flatten a structured payload into a plain JSON value before transmission.
///
/// A typed value becomes a mapping of its fields, mappings and sequences are
/// flattened recursively, primitives pass through unchanged.
pub fn flatten<T: Serialize + ?Sized>(payload: &T) -> Result<Value, AiError> {
    serde_json::to_value(payload).map_err(|e| AiError::Payload(e.to_string()))
}
