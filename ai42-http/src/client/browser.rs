//! Wallet-signed payment client.

use std::fmt;
use std::sync::Arc;

use ai42::{BrowserPaymentConfig, Error, Network, Result};
use async_trait::async_trait;
use reqwest::{Request, Response};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::{PaymentClient, handle_error};
use crate::fetch::{PaymentFetch, WalletFetchFactory};

/// Payment client whose payments are signed by a connected wallet.
///
/// The payment-aware fetch is built once, synchronously, at construction.
#[derive(Clone)]
pub struct BrowserPaymentClient {
    network: Network,
    max_payment_amount: u64,
    inner: Arc<dyn PaymentFetch>,
}

impl BrowserPaymentClient {
    /// Creates a client from `config`, binding a fetch through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed)
    /// if the config carries no wallet. Factory failures are normalized
    /// through [`handle_error`].
    pub fn new(config: BrowserPaymentConfig, factory: &dyn WalletFetchFactory) -> Result<Self> {
        let max_payment_amount = config.max_payment_amount();
        let wallet = config
            .wallet
            .ok_or_else(|| Error::payment_failed("Wallet is required for browser payment client"))?;

        let inner = factory
            .create(wallet, config.network, max_payment_amount)
            .map_err(|e| handle_error(e, "Failed to create browser payment client"))?;

        Ok(Self {
            network: config.network,
            max_payment_amount,
            inner,
        })
    }

    /// Effective per-request ceiling.
    #[must_use]
    pub const fn max_payment_amount(&self) -> u64 {
        self.max_payment_amount
    }
}

impl fmt::Debug for BrowserPaymentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserPaymentClient")
            .field("network", &self.network)
            .field("max_payment_amount", &self.max_payment_amount)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentClient for BrowserPaymentClient {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ai42.browser.fetch", skip_all, fields(url = %request.url()), err)
    )]
    async fn fetch(&self, request: Request) -> Result<Response> {
        self.inner
            .fetch(request)
            .await
            .map_err(|e| handle_error(e, "Browser payment fetch failed"))
    }

    fn network(&self) -> Network {
        self.network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::X402FetchFactory;
    use crate::testing::{AmountBuilder, FakeWallet};
    use ai42::{BoxError, ErrorKind, Wallet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingFactory {
        calls: Mutex<Vec<(Network, u64)>>,
    }

    struct Unreachable;

    #[async_trait]
    impl PaymentFetch for Unreachable {
        async fn fetch(&self, _request: Request) -> std::result::Result<Response, BoxError> {
            Err(std::io::Error::other("connection refused").into())
        }
    }

    impl WalletFetchFactory for RecordingFactory {
        fn create(
            &self,
            _wallet: Arc<dyn Wallet>,
            network: Network,
            max_payment_amount: u64,
        ) -> std::result::Result<Arc<dyn PaymentFetch>, BoxError> {
            self.calls.lock().unwrap().push((network, max_payment_amount));
            Ok(Arc::new(Unreachable))
        }
    }

    fn config(wallet: Option<Arc<dyn Wallet>>) -> BrowserPaymentConfig {
        BrowserPaymentConfig {
            wallet,
            network: Network::SolanaMainnet,
            max_payment_amount: None,
        }
    }

    #[test]
    fn wallet_is_required() {
        let factory = RecordingFactory::default();
        let err = BrowserPaymentClient::new(config(None), &factory).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentFailed);
        assert_eq!(err.message(), "Wallet is required for browser payment client");
        assert!(factory.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn factory_receives_network_and_default_ceiling() {
        let factory = RecordingFactory::default();
        let client =
            BrowserPaymentClient::new(config(Some(Arc::new(FakeWallet::new()))), &factory).unwrap();
        assert_eq!(client.network(), Network::SolanaMainnet);
        assert_eq!(
            *factory.calls.lock().unwrap(),
            vec![(Network::SolanaMainnet, ai42::DEFAULT_MAX_PAYMENT_AMOUNT)]
        );
    }

    #[test]
    fn factory_without_builder_rejects_wallets() {
        let err = BrowserPaymentClient::new(
            config(Some(Arc::new(FakeWallet::new()))),
            &X402FetchFactory::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let factory = X402FetchFactory::new().with_transaction_builder(AmountBuilder);
        assert!(
            BrowserPaymentClient::new(config(Some(Arc::new(FakeWallet::new()))), &factory).is_ok()
        );
    }

    #[tokio::test]
    async fn transport_failures_are_internal() {
        let factory = RecordingFactory::default();
        let client =
            BrowserPaymentClient::new(config(Some(Arc::new(FakeWallet::new()))), &factory).unwrap();
        let request = Request::new(
            reqwest::Method::GET,
            "http://localhost/chat".parse().unwrap(),
        );
        let err = client.fetch(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(
            err.message(),
            "Browser payment fetch failed: connection refused"
        );
    }
}
