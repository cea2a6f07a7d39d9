//! The uniform error type of the AI42 SDK.
//!
//! Every public operation fails with [`Error`]. Its [`ErrorKind`] is a closed
//! set, so callers can branch on it without string matching. Once a failure is
//! an [`Error`] it is passed along unchanged; foreign failures are wrapped
//! exactly once, where they are first observed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Convenience alias used throughout the SDK.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed foreign error, as produced by collaborators outside the SDK.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The request was malformed or the SDK was misconfigured.
    InvalidRequest,
    /// The server requires a payment the client could not make.
    PaymentRequired,
    /// A wallet, signer or payment receipt could not be used.
    PaymentFailed,
    /// The inference service reported a failure.
    ModelError,
    /// The service is throttling this caller.
    #[serde(rename = "RATE_LIMIT")]
    RateLimited,
    /// Anything else: transport failures, undecodable bodies.
    InternalError,
}

impl ErrorKind {
    /// Wire code of this kind, as used by the API's error bodies.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::PaymentRequired => "PAYMENT_REQUIRED",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::ModelError => "MODEL_ERROR",
            Self::RateLimited => "RATE_LIMIT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Opaque extra information attached to an [`Error`].
#[derive(Debug, Clone)]
pub enum ErrorDetails {
    /// A raw JSON document, typically the response body that carried the error.
    Body(serde_json::Value),
    /// The foreign error this one wraps.
    Source(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

/// The single error representation of the SDK.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    details: Option<ErrorDetails>,
}

impl Error {
    /// Creates an error without details.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches a JSON document as details.
    #[must_use]
    pub fn with_details(mut self, body: serde_json::Value) -> Self {
        self.details = Some(ErrorDetails::Body(body));
        self
    }

    /// Attaches the wrapped foreign error as details.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.details = Some(ErrorDetails::Source(Arc::from(source.into())));
        self
    }

    /// Shorthand for [`ErrorKind::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Shorthand for [`ErrorKind::PaymentRequired`].
    pub fn payment_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PaymentRequired, message)
    }

    /// Shorthand for [`ErrorKind::PaymentFailed`].
    pub fn payment_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PaymentFailed, message)
    }

    /// Shorthand for [`ErrorKind::ModelError`].
    pub fn model_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelError, message)
    }

    /// Shorthand for [`ErrorKind::RateLimited`].
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Shorthand for [`ErrorKind::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// The error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extra information, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&ErrorDetails> {
        self.details.as_ref()
    }

    /// The JSON body attached to this error, if the details are a body.
    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        match &self.details {
            Some(ErrorDetails::Body(body)) => Some(body),
            _ => None,
        }
    }

    /// Renders this error in the API's `{code, message, details}` shape.
    ///
    /// Source errors are rendered as their display string.
    #[must_use]
    pub fn to_api_error(&self) -> ApiError {
        let details = match &self.details {
            Some(ErrorDetails::Body(body)) => Some(body.clone()),
            Some(ErrorDetails::Source(source)) => {
                Some(serde_json::Value::String(source.to_string()))
            }
            None => None,
        };
        ApiError {
            code: self.kind.code().to_owned(),
            message: self.message.clone(),
            details,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.details {
            Some(ErrorDetails::Source(source)) => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Error body as exchanged with the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Wire code, see [`ErrorKind::code`].
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional opaque details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
