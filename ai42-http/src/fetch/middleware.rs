//! reqwest middleware answering 402 challenges.
//!
//! When a response with status 402 is received, the middleware:
//! 1. Decodes the challenge from the `PAYMENT-REQUIRED` header (V2) or the JSON body (V1)
//! 2. Keeps the requirements for its network, then those within its ceiling
//! 3. Has its [`PaymentAuthorizer`] sign the first remaining requirement
//! 4. Retries the request once with `X-PAYMENT` (V1) or `PAYMENT-SIGNATURE` (V2)
//!
//! Every failure leaves the middleware as an [`ai42::Error`].

use ai42::{Error, Network, PaymentPayload, PaymentRequired, PaymentRequirements, Result};
use http::header::{HeaderName, HeaderValue};
use http::{Extensions, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

use super::authorizer::PaymentAuthorizer;
use crate::constants::{PAYMENT_REQUIRED_HEADER, PAYMENT_SIGNATURE_HEADER, X_PAYMENT_HEADER};
use crate::headers::{decode_payment_required, encode_payment_payload};

/// Pays for requests on one network, up to a per-request ceiling.
#[derive(Debug, Clone)]
pub struct PaymentMiddleware<A> {
    authorizer: A,
    network: Network,
    max_payment_amount: u64,
}

impl<A> PaymentMiddleware<A> {
    /// Creates a middleware paying on `network` with at most `max_payment_amount` per request.
    pub const fn new(authorizer: A, network: Network, max_payment_amount: u64) -> Self {
        Self {
            authorizer,
            network,
            max_payment_amount,
        }
    }

    /// Picks the requirement to pay: first match on network, then on ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PaymentRequired`](ai42::ErrorKind::PaymentRequired)
    /// if no requirement targets this network or all of them exceed the ceiling.
    pub fn select<'a>(&self, required: &'a PaymentRequired) -> Result<&'a PaymentRequirements> {
        let on_network: Vec<&PaymentRequirements> = required
            .accepts
            .iter()
            .filter(|r| self.network.matches(&r.network))
            .collect();
        if on_network.is_empty() {
            return Err(Error::payment_required(format!(
                "No payment option offered on {}",
                self.network
            )));
        }

        let ceiling = u128::from(self.max_payment_amount);
        on_network
            .iter()
            .copied()
            .find(|r| r.amount().is_some_and(|amount| amount <= ceiling))
            .ok_or_else(|| {
                let cheapest = on_network
                    .iter()
                    .map(|r| r.max_amount_required.as_str())
                    .min_by_key(|amount| amount.parse::<u128>().unwrap_or(u128::MAX))
                    .unwrap_or_default();
                Error::payment_required(format!(
                    "Requested payment {cheapest} exceeds the maximum of {}",
                    self.max_payment_amount
                ))
            })
    }
}

impl<A> PaymentMiddleware<A>
where
    A: PaymentAuthorizer,
{
    /// Builds the payment header answering a 402 response.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed) if
    /// the challenge cannot be decoded or the authorizer fails, and
    /// [`ErrorKind::PaymentRequired`](ai42::ErrorKind::PaymentRequired) if no
    /// requirement is acceptable.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ai42.fetch.payment_header", skip_all, err)
    )]
    pub async fn payment_header(&self, res: Response) -> Result<(HeaderName, HeaderValue)> {
        let required = parse_payment_required(res).await?;
        let selected = self.select(&required)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %selected.scheme,
            network = %selected.network,
            amount = %selected.max_amount_required,
            "Selected payment requirement"
        );

        let payload = self.authorizer.authorize(selected).await?;
        let payload = PaymentPayload::new(required.x402_version, selected, payload);
        let encoded = encode_payment_payload(&payload).map_err(|e| {
            Error::payment_failed(format!("Failed to encode payment payload: {e}")).with_source(e)
        })?;
        let value = HeaderValue::from_str(&encoded).map_err(|e| {
            Error::internal(format!("Payment payload is not a valid header value: {e}"))
                .with_source(e)
        })?;

        let name = if required.x402_version >= 2 {
            PAYMENT_SIGNATURE_HEADER
        } else {
            X_PAYMENT_HEADER
        };
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::internal(format!("Invalid payment header name: {e}")))?;
        Ok((name, value))
    }
}

/// Runs the next middleware or HTTP client with optional telemetry instrumentation.
#[cfg_attr(feature = "telemetry", instrument(name = "ai42.fetch.next", skip_all))]
async fn run_next(
    next: rqm::Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> rqm::Result<Response> {
    next.run(req, extensions).await
}

#[async_trait::async_trait]
impl<A> rqm::Middleware for PaymentMiddleware<A>
where
    A: PaymentAuthorizer + 'static,
{
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ai42.fetch.handle", skip_all, err)
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = run_next(next.clone(), req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = ?res.url(), "Received 402 Payment Required, processing payment");

        let mut retry = retry_req.ok_or_else(|| {
            rqm::Error::Middleware(
                Error::internal("Request body cannot be replayed with a payment").into(),
            )
        })?;

        let (name, value) = self
            .payment_header(res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;
        retry.headers_mut().insert(name, value);

        #[cfg(feature = "telemetry")]
        trace!(url = ?retry.url(), "Retrying request with payment header");

        run_next(next, retry, extensions).await
    }
}

/// Decodes the challenge of a 402 response.
///
/// The V2 `PAYMENT-REQUIRED` header wins over a V1 JSON body.
///
/// # Errors
///
/// Returns [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed) if
/// neither carries a valid challenge.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "ai42.fetch.parse_payment_required", skip(response), err)
)]
pub async fn parse_payment_required(response: Response) -> Result<PaymentRequired> {
    if let Some(header) = response.headers().get(PAYMENT_REQUIRED_HEADER) {
        let header = header.to_str().map_err(|e| {
            Error::payment_failed(format!("Invalid 402 response: {e}")).with_source(e)
        })?;
        return decode_payment_required(header).map_err(|e| {
            Error::payment_failed(format!("Invalid 402 response: {e}")).with_source(e)
        });
    }

    let body = response.bytes().await.map_err(|e| {
        Error::payment_failed(format!("Invalid 402 response: {e}")).with_source(e)
    })?;
    serde_json::from_slice(&body)
        .map_err(|e| Error::payment_failed(format!("Invalid 402 response: {e}")).with_source(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PaymentFetch;
    use crate::testing::{CountingSigner, challenge_v1, requirement};
    use ai42::ErrorKind;
    use ai42::encoding;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::fetch::SignerAuthorizer;

    fn client_for(signer: Arc<CountingSigner>, max: u64) -> rqm::ClientWithMiddleware {
        rqm::ClientBuilder::new(reqwest::Client::new())
            .with(PaymentMiddleware::new(
                SignerAuthorizer::new(signer),
                Network::SolanaDevnet,
                max,
            ))
            .build()
    }

    fn post(server: &MockServer) -> Request {
        let url = format!("{}/paid", server.uri()).parse().unwrap();
        let mut req = Request::new(reqwest::Method::POST, url);
        *req.body_mut() = Some("{}".into());
        req
    }

    #[test]
    fn select_prefers_first_affordable_on_network() {
        let middleware = PaymentMiddleware::new((), Network::SolanaDevnet, 1_000);
        let required = PaymentRequired {
            x402_version: 1,
            accepts: vec![
                requirement("base-sepolia", "10"),
                requirement("solana-devnet", "5000"),
                requirement("solana-devnet", "900"),
            ],
            error: None,
        };
        let selected = middleware.select(&required).unwrap();
        assert_eq!(selected.max_amount_required, "900");
    }

    #[test]
    fn select_reports_why_nothing_matched() {
        let middleware = PaymentMiddleware::new((), Network::SolanaMainnet, 1_000);
        let required = PaymentRequired {
            x402_version: 1,
            accepts: vec![requirement("solana-devnet", "10")],
            error: None,
        };
        let err = middleware.select(&required).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentRequired);

        let required = PaymentRequired {
            x402_version: 1,
            accepts: vec![requirement("solana", "7000"), requirement("solana", "3000")],
            error: None,
        };
        let err = middleware.select(&required).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PaymentRequired);
        assert_eq!(
            err.message(),
            "Requested payment 3000 exceeds the maximum of 1000"
        );
    }

    #[tokio::test]
    async fn passes_through_unpaid_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paid"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let signer = Arc::new(CountingSigner::default());
        let res = client_for(signer.clone(), 1_000_000)
            .fetch(post(&server))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retries_v1_challenge_with_x_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paid"))
            .and(header_exists("x-payment"))
            .respond_with(ResponseTemplate::new(200).set_body_string("paid"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/paid"))
            .respond_with(ResponseTemplate::new(402).set_body_json(challenge_v1("1000")))
            .expect(1)
            .mount(&server)
            .await;

        let signer = Arc::new(CountingSigner::default());
        let res = client_for(signer.clone(), 1_000_000)
            .fetch(post(&server))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);

        let requests = server.received_requests().await.unwrap();
        let header = requests[1].headers.get("x-payment").unwrap();
        let payload: PaymentPayload = encoding::decode_json(header.to_str().unwrap()).unwrap();
        assert_eq!(payload.x402_version, 1);
        assert_eq!(payload.scheme, "exact");
        assert_eq!(payload.network, "solana-devnet");
        assert_eq!(payload.payload["transaction"], "c2lnbmVk");
    }

    #[tokio::test]
    async fn v2_header_challenge_uses_payment_signature() {
        let server = MockServer::start().await;
        let challenge = encoding::encode_json(&PaymentRequired {
            x402_version: 2,
            accepts: vec![requirement("solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1", "10")],
            error: None,
        })
        .unwrap();
        Mock::given(method("POST"))
            .and(header_exists("payment-signature"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).insert_header(PAYMENT_REQUIRED_HEADER, challenge))
            .mount(&server)
            .await;

        let signer = Arc::new(CountingSigner::default());
        let res = client_for(signer, 1_000_000)
            .fetch(post(&server))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let requests = server.received_requests().await.unwrap();
        let header = requests[1].headers.get("payment-signature").unwrap();
        let payload: PaymentPayload = encoding::decode_json(header.to_str().unwrap()).unwrap();
        assert_eq!(payload.x402_version, 2);
        assert!(payload.accepted.is_some());
    }

    #[tokio::test]
    async fn over_ceiling_challenge_is_not_signed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(challenge_v1("5000000")))
            .expect(1)
            .mount(&server)
            .await;

        let signer = Arc::new(CountingSigner::default());
        let err = client_for(signer.clone(), 1_000_000)
            .fetch(post(&server))
            .await
            .unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::PaymentRequired);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn garbage_challenge_is_payment_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_string("pay up"))
            .mount(&server)
            .await;

        let signer = Arc::new(CountingSigner::default());
        let err = client_for(signer, 1_000_000)
            .fetch(post(&server))
            .await
            .unwrap_err();
        let err = err.downcast::<Error>().unwrap();
        assert_eq!(err.kind(), ErrorKind::PaymentFailed);
        assert!(err.message().starts_with("Invalid 402 response"));
    }
}
