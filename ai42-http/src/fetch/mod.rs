//! Payment-aware fetch: the transport the payment clients delegate to.
//!
//! A payment client never talks to the network itself. It asks a factory for
//! a [`PaymentFetch`] bound to its credential, network and ceiling, and
//! forwards every request to it. The factories are the seam where any
//! x402 implementation can be plugged in.
//!
//! The crate ships one: [`X402FetchFactory`], a `reqwest` client carrying
//! [`PaymentMiddleware`], which answers 402 challenges through a
//! [`PaymentAuthorizer`].

mod authorizer;
mod middleware;

pub use authorizer::{PaymentAuthorizer, SignerAuthorizer, TransactionBuilder, WalletAuthorizer};
pub use middleware::{PaymentMiddleware, parse_payment_required};

use std::fmt;
use std::sync::Arc;

use ai42::{BoxError, Error, Network, Signer, Wallet};
use async_trait::async_trait;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;

/// A fetch that performs payment handshakes transparently.
#[async_trait]
pub trait PaymentFetch: Send + Sync {
    /// Sends `request`, paying for it if challenged, and returns the final response.
    async fn fetch(&self, request: Request) -> Result<Response, BoxError>;
}

/// Builds wallet-signed fetches. Construction is synchronous.
pub trait WalletFetchFactory: Send + Sync {
    /// Binds a fetch to `wallet`, `network` and a per-request ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if no fetch can be bound to these parameters.
    fn create(
        &self,
        wallet: Arc<dyn Wallet>,
        network: Network,
        max_payment_amount: u64,
    ) -> Result<Arc<dyn PaymentFetch>, BoxError>;
}

/// Builds signer-backed fetches. Construction may need to derive signing
/// material and is therefore asynchronous.
#[async_trait]
pub trait SignerFetchFactory: Send + Sync {
    /// Binds a fetch to `signer`, `network` and a per-request ceiling.
    async fn create(
        &self,
        signer: Arc<dyn Signer>,
        network: Network,
        max_payment_amount: u64,
    ) -> Result<Arc<dyn PaymentFetch>, BoxError>;
}

#[async_trait]
impl PaymentFetch for rqm::ClientWithMiddleware {
    async fn fetch(&self, request: Request) -> Result<Response, BoxError> {
        self.execute(request).await.map_err(unwrap_middleware_error)
    }
}

/// Recovers SDK errors raised inside the middleware stack.
fn unwrap_middleware_error(error: rqm::Error) -> BoxError {
    match error {
        rqm::Error::Middleware(error) => match error.downcast::<Error>() {
            Ok(error) => Box::new(error),
            Err(error) => error.into(),
        },
        other => Box::new(other),
    }
}

/// The built-in x402 fetch factory.
///
/// Signer-backed fetches work out of the box. Wallet-signed fetches also
/// need a [`TransactionBuilder`] to produce the transfer the wallet signs.
#[derive(Clone, Default)]
pub struct X402FetchFactory {
    client: reqwest::Client,
    transaction_builder: Option<Arc<dyn TransactionBuilder>>,
}

impl X402FetchFactory {
    /// Creates a factory using a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `client` as the underlying HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Sets the builder producing unsigned transfers for wallet payments.
    #[must_use]
    pub fn with_transaction_builder(mut self, builder: impl TransactionBuilder + 'static) -> Self {
        self.transaction_builder = Some(Arc::new(builder));
        self
    }

    fn bind<A>(&self, authorizer: A, network: Network, max_payment_amount: u64) -> Arc<dyn PaymentFetch>
    where
        A: PaymentAuthorizer + 'static,
    {
        let middleware = PaymentMiddleware::new(authorizer, network, max_payment_amount);
        Arc::new(
            rqm::ClientBuilder::new(self.client.clone())
                .with(middleware)
                .build(),
        )
    }
}

impl fmt::Debug for X402FetchFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X402FetchFactory")
            .field("transaction_builder", &self.transaction_builder.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletFetchFactory for X402FetchFactory {
    fn create(
        &self,
        wallet: Arc<dyn Wallet>,
        network: Network,
        max_payment_amount: u64,
    ) -> Result<Arc<dyn PaymentFetch>, BoxError> {
        let builder = self.transaction_builder.clone().ok_or_else(|| {
            Error::invalid_request("Wallet payments need a transaction builder")
        })?;
        let authorizer = WalletAuthorizer::new(wallet, builder);
        Ok(self.bind(authorizer, network, max_payment_amount))
    }
}

#[async_trait]
impl SignerFetchFactory for X402FetchFactory {
    async fn create(
        &self,
        signer: Arc<dyn Signer>,
        network: Network,
        max_payment_amount: u64,
    ) -> Result<Arc<dyn PaymentFetch>, BoxError> {
        Ok(self.bind(SignerAuthorizer::new(signer), network, max_payment_amount))
    }
}
