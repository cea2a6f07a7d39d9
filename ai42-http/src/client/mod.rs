//! Payment clients: an HTTP fetch that pays for what it requests.
//!
//! [`PaymentClient`] is the one capability the facade relies on. It has two
//! independent implementations:
//!
//! - **[`BrowserPaymentClient`]** - payments signed by an injected wallet
//! - **[`ServerPaymentClient`]** - payments signed by a held signer, after a
//!   one-time asynchronous initialization
//!
//! They share nothing but the free helpers [`extract_payment_info`] and
//! [`handle_error`].

mod browser;
mod server;

pub use browser::BrowserPaymentClient;
pub use server::{InitState, ServerPaymentClient};

pub use crate::headers::extract_payment_info;

use ai42::{BoxError, Error, Network, Result};
use async_trait::async_trait;
use reqwest::{Request, Response};

/// Performs HTTP requests, transparently satisfying payment challenges.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Sends `request` and returns the final response, paid if the server asked for it.
    ///
    /// Non-success statuses other than 402 are returned as responses, not errors.
    async fn fetch(&self, request: Request) -> Result<Response>;

    /// The network this client pays on.
    fn network(&self) -> Network;
}

/// Normalizes a failure into the SDK's [`Error`].
///
/// An [`Error`] comes back unchanged, kind and details included. Anything
/// else becomes an [`ErrorKind::InternalError`](ai42::ErrorKind::InternalError)
/// whose message is prefixed with `context`.
pub fn handle_error(error: impl Into<BoxError>, context: &str) -> Error {
    let error: BoxError = error.into();
    match error.downcast::<Error>() {
        Ok(error) => *error,
        Err(other) => Error::internal(format!("{context}: {other}")).with_source(other),
    }
}
