//! Encoding and decoding of the payment headers.
//!
//! All payment headers carry a base64-encoded JSON document.

use ai42::encoding::{self, EnvelopeError};
use ai42::{Error, PaymentInfo, PaymentPayload, PaymentRequired, Result};
use http::HeaderMap;

use crate::constants::X_PAYMENT_RESPONSE_HEADER;

/// Decodes the payment receipt of a response, if there is one.
///
/// A missing header is not an error: most responses involve no payment.
///
/// # Errors
///
/// Returns [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed),
/// carrying the parse error as source, if the header is present but
/// cannot be decoded.
pub fn extract_payment_info(headers: &HeaderMap) -> Result<Option<PaymentInfo>> {
    let Some(value) = headers.get(X_PAYMENT_RESPONSE_HEADER) else {
        return Ok(None);
    };

    let info = value
        .to_str()
        .map_err(|e| Error::payment_failed("Failed to parse payment response").with_source(e))
        .and_then(|value| {
            encoding::decode_json::<PaymentInfo>(value).map_err(|e| {
                Error::payment_failed("Failed to parse payment response").with_source(e)
            })
        })?;
    Ok(Some(info))
}

/// Decodes a `PAYMENT-REQUIRED` header value.
///
/// # Errors
///
/// Returns [`EnvelopeError`] on base64 or JSON decode failure.
pub fn decode_payment_required(header_value: &str) -> Result<PaymentRequired, EnvelopeError> {
    encoding::decode_json(header_value)
}

/// Encodes a payment payload for the `X-PAYMENT` / `PAYMENT-SIGNATURE` header.
///
/// # Errors
///
/// Returns [`EnvelopeError::Json`] if serialization fails.
pub fn encode_payment_payload(payload: &PaymentPayload) -> Result<String, EnvelopeError> {
    encoding::encode_json(payload)
}
