//! Base64 JSON envelopes, as carried by the payment headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Failure to decode a base64 JSON envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The value is not valid base64.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not the expected JSON document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes raw bytes as standard base64.
pub fn encode_bytes<T: AsRef<[u8]>>(input: T) -> String {
    b64.encode(input.as_ref())
}

/// Decodes standard base64, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`EnvelopeError::Base64`] if the value is not valid base64.
pub fn decode_bytes(value: &str) -> Result<Vec<u8>, EnvelopeError> {
    Ok(b64.decode(value.trim())?)
}

/// Serializes `value` to JSON and wraps it in base64.
///
/// # Errors
///
/// Returns [`EnvelopeError::Json`] if serialization fails.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String, EnvelopeError> {
    let json = serde_json::to_vec(value)?;
    Ok(encode_bytes(json))
}

/// Unwraps a base64 envelope and parses the JSON inside.
///
/// # Errors
///
/// Returns [`EnvelopeError`] on base64 or JSON failure.
pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, EnvelopeError> {
    let bytes = decode_bytes(value)?;
    Ok(serde_json::from_slice(&bytes)?)
}
