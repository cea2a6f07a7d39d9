//! Signer-backed payment client with one-time asynchronous initialization.

use std::fmt;
use std::sync::Arc;

use ai42::{Error, Network, Result, ServerPaymentConfig};
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::{Request, Response};
#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use super::{PaymentClient, handle_error};
use crate::fetch::{PaymentFetch, SignerFetchFactory};

type InitFuture = Shared<BoxFuture<'static, Result<Arc<dyn PaymentFetch>>>>;

/// Progress of a [`ServerPaymentClient`]'s initialization.
#[derive(Debug, Clone)]
pub enum InitState {
    /// The fetch is still being built.
    Initializing,
    /// The fetch is built; requests go straight through.
    Ready,
    /// Initialization failed; every request returns this error.
    Failed(Error),
}

/// Payment client whose payments are signed by a held [`Signer`](ai42::Signer).
///
/// Building the payment-aware fetch is asynchronous. It starts in the
/// background at construction when a Tokio runtime is running, otherwise on
/// the first request. Concurrent requests share the same initialization, so
/// the factory runs at most once per client.
#[derive(Clone)]
pub struct ServerPaymentClient {
    network: Network,
    max_payment_amount: u64,
    init: InitFuture,
}

impl ServerPaymentClient {
    /// Creates a client from `config`, binding a fetch through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed)
    /// if the config carries no signer. Initialization errors are reported
    /// by [`fetch`](PaymentClient::fetch), not here.
    pub fn new(config: ServerPaymentConfig, factory: Arc<dyn SignerFetchFactory>) -> Result<Self> {
        let max_payment_amount = config.max_payment_amount();
        let network = config.network;
        let signer = config
            .signer
            .ok_or_else(|| Error::payment_failed("Signer is required for server payment client"))?;

        let init: InitFuture = async move {
            #[cfg(feature = "telemetry")]
            debug!(%network, max_payment_amount, "Initializing server payment client");

            factory
                .create(signer, network, max_payment_amount)
                .await
                .map_err(|e| handle_error(e, "Failed to initialize server payment client"))
        }
        .boxed()
        .shared();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            drop(handle.spawn(init.clone()));
        }

        Ok(Self {
            network,
            max_payment_amount,
            init,
        })
    }

    /// Where initialization stands, without waiting for it.
    #[must_use]
    pub fn state(&self) -> InitState {
        match self.init.peek() {
            None => InitState::Initializing,
            Some(Ok(_)) => InitState::Ready,
            Some(Err(e)) => InitState::Failed(e.clone()),
        }
    }

    /// Waits for initialization to finish.
    ///
    /// # Errors
    ///
    /// Returns the initialization error, if any.
    pub async fn ready(&self) -> Result<()> {
        self.init.clone().await.map(|_| ())
    }

    /// Effective per-request ceiling.
    #[must_use]
    pub const fn max_payment_amount(&self) -> u64 {
        self.max_payment_amount
    }
}

impl fmt::Debug for ServerPaymentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerPaymentClient")
            .field("network", &self.network)
            .field("max_payment_amount", &self.max_payment_amount)
            .field("state", &self.state())
            .finish()
    }
}

#[async_trait]
impl PaymentClient for ServerPaymentClient {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ai42.server.fetch", skip_all, fields(url = %request.url()), err)
    )]
    async fn fetch(&self, request: Request) -> Result<Response> {
        let inner = self.init.clone().await?;
        inner
            .fetch(request)
            .await
            .map_err(|e| handle_error(e, "Server payment fetch failed"))
    }

    fn network(&self) -> Network {
        self.network
    }
}
