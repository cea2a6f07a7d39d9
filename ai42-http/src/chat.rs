//! The SDK facade: chat requests over a payment client.

use std::fmt;
use std::sync::Arc;

use ai42::{
    AI42Config, BrowserPaymentConfig, ChatRequest, ChatResponse, Error, ErrorKind,
    ModelIdentifier, PaymentInfo, Priority, Result, ServerPaymentConfig, Signer, Wallet,
};
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use reqwest::Request;
use url::Url;
#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::client::{
    BrowserPaymentClient, PaymentClient, ServerPaymentClient, extract_payment_info, handle_error,
};
use crate::fetch::{SignerFetchFactory, WalletFetchFactory, X402FetchFactory};

const CHAT_FAILED: &str = "Chat request failed";

/// Client of the AI42 inference API.
///
/// Every request goes through a [`PaymentClient`], which settles the
/// payment the API asks for before the answer is returned.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # async fn run(signer: Arc<dyn ai42::Signer>) -> ai42::Result<()> {
/// use ai42::{AI42Config, ModelIdentifier};
/// use ai42_http::AI42Client;
///
/// let config = AI42Config::parse("https://api.ai42.example")?;
/// let client = AI42Client::from_signer(config, signer).await?;
/// let answer = client
///     .chat_with_model("Hello!", ModelIdentifier::Gemini25Flash)
///     .await?;
/// println!("{}", answer.content);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AI42Client {
    chat_url: Url,
    payment_client: Arc<dyn PaymentClient>,
}

impl AI42Client {
    /// Creates a client sending requests through `payment_client`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidRequest`] if the configured URL cannot
    /// carry the chat path.
    pub fn new(config: &AI42Config, payment_client: Arc<dyn PaymentClient>) -> Result<Self> {
        Ok(Self {
            chat_url: config.chat_url()?,
            payment_client,
        })
    }

    /// Creates a client paying with a connected browser wallet.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`BrowserPaymentClient::new`] and [`AI42Client::new`].
    pub fn from_wallet(
        config: &AI42Config,
        wallet: Arc<dyn Wallet>,
        factory: &dyn WalletFetchFactory,
    ) -> Result<Self> {
        let payment = BrowserPaymentConfig {
            wallet: Some(wallet),
            network: config.network(),
            max_payment_amount: Some(config.max_payment_amount()),
        };
        let client = BrowserPaymentClient::new(payment, factory)?;
        Self::new(config, Arc::new(client))
    }

    /// Creates a client paying with a held signer, through the built-in
    /// [`X402FetchFactory`].
    ///
    /// Initialization of the payment client starts in the background; its
    /// failure is reported by the first request.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ServerPaymentClient::new`] and [`AI42Client::new`].
    #[allow(clippy::unused_async)]
    pub async fn from_signer(config: AI42Config, signer: Arc<dyn Signer>) -> Result<Self> {
        Self::from_signer_with(&config, signer, Arc::new(X402FetchFactory::new()))
    }

    /// Like [`from_signer`](Self::from_signer), with a custom fetch factory.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ServerPaymentClient::new`] and [`AI42Client::new`].
    pub fn from_signer_with(
        config: &AI42Config,
        signer: Arc<dyn Signer>,
        factory: Arc<dyn SignerFetchFactory>,
    ) -> Result<Self> {
        let payment = ServerPaymentConfig {
            signer: Some(signer),
            network: config.network(),
            max_payment_amount: Some(config.max_payment_amount()),
        };
        let client = ServerPaymentClient::new(payment, factory)?;
        Self::new(config, Arc::new(client))
    }

    /// Sends a chat request and returns the model's answer.
    ///
    /// The payment receipt header is never read here; use
    /// [`chat_with_receipt`](Self::chat_with_receipt) to get it.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::ModelError`] if the API answers with an `error` field
    /// - [`ErrorKind::InvalidRequest`], [`ErrorKind::PaymentRequired`] or
    ///   [`ErrorKind::RateLimited`] for the matching HTTP statuses
    /// - payment errors from the payment client, unchanged
    /// - [`ErrorKind::InternalError`] for anything else
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "ai42.chat",
            skip_all,
            fields(model = ?request.model, priority = ?request.priority),
            err
        )
    )]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let (status, _, bytes) = self.exchange(&request).await?;
        decode(status, &bytes)
    }

    /// Sends `message` to a specific model.
    ///
    /// # Errors
    ///
    /// See [`chat`](Self::chat).
    pub async fn chat_with_model(
        &self,
        message: impl Into<String> + Send,
        model: ModelIdentifier,
    ) -> Result<ChatResponse> {
        self.chat(ChatRequest::new(message).with_model(model)).await
    }

    /// Sends `message`, letting the API route it by priority.
    ///
    /// # Errors
    ///
    /// See [`chat`](Self::chat).
    pub async fn chat_with_priority(
        &self,
        message: impl Into<String> + Send,
        priority: Priority,
    ) -> Result<ChatResponse> {
        self.chat(ChatRequest::new(message).with_priority(priority))
            .await
    }

    /// Sends a chat request and also returns the receipt of the payment it
    /// cost, if the response carries one.
    ///
    /// # Errors
    ///
    /// See [`chat`](Self::chat). A receipt that cannot be decoded is an
    /// [`ErrorKind::PaymentFailed`], reported only once the answer itself
    /// decoded.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "ai42.chat_with_receipt",
            skip_all,
            fields(model = ?request.model, priority = ?request.priority),
            err
        )
    )]
    pub async fn chat_with_receipt(
        &self,
        request: ChatRequest,
    ) -> Result<(ChatResponse, Option<PaymentInfo>)> {
        let (status, headers, bytes) = self.exchange(&request).await?;
        let answer = decode(status, &bytes)?;
        let receipt = extract_payment_info(&headers)?;

        #[cfg(feature = "telemetry")]
        debug!(
            request_id = %answer.request_id,
            paid = receipt.as_ref().map(|r| r.amount),
            "Payment receipt decoded"
        );

        Ok((answer, receipt))
    }

    /// The network payments are made on.
    #[must_use]
    pub fn network(&self) -> ai42::Network {
        self.payment_client.network()
    }

    /// Posts `request` and reads the final response in full.
    async fn exchange(&self, request: &ChatRequest) -> Result<(StatusCode, HeaderMap, Vec<u8>)> {
        let response = self.payment_client.fetch(self.build(request)?).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| handle_error(e, CHAT_FAILED))?;

        #[cfg(feature = "telemetry")]
        debug!(%status, bytes = bytes.len(), "Chat response received");

        Ok((status, headers, bytes.to_vec()))
    }

    fn build(&self, request: &ChatRequest) -> Result<Request> {
        let body = serde_json::to_vec(request).map_err(|e| handle_error(e, CHAT_FAILED))?;
        let mut req = Request::new(Method::POST, self.chat_url.clone());
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());
        Ok(req)
    }
}

impl fmt::Debug for AI42Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AI42Client")
            .field("chat_url", &self.chat_url.as_str())
            .field("network", &self.payment_client.network())
            .finish_non_exhaustive()
    }
}

/// Maps a final response to the answer or the error it carries.
fn decode(status: StatusCode, bytes: &[u8]) -> Result<ChatResponse> {
    let body = match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(body) => body,
        Err(e) if status.is_success() => return Err(handle_error(e, CHAT_FAILED)),
        Err(_) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            return Err(status_error(status).with_details(serde_json::Value::String(text)));
        }
    };

    if let Some(message) = body.get("error").and_then(model_error_message) {
        return Err(Error::model_error(message).with_details(body));
    }
    if !status.is_success() {
        return Err(status_error(status).with_details(body));
    }

    serde_json::from_value(body).map_err(|e| handle_error(e, CHAT_FAILED))
}

/// Message of an `error` field, `None` when the field does not signal an error.
fn model_error_message(error: &serde_json::Value) -> Option<String> {
    match error {
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        serde_json::Value::String(message) if message.is_empty() => None,
        serde_json::Value::String(message) => Some(message.clone()),
        other => Some(
            other
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| other.to_string(), str::to_owned),
        ),
    }
}

fn status_error(status: StatusCode) -> Error {
    let kind = match status {
        StatusCode::BAD_REQUEST => ErrorKind::InvalidRequest,
        StatusCode::PAYMENT_REQUIRED => ErrorKind::PaymentRequired,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        _ => ErrorKind::InternalError,
    };
    Error::new(kind, format!("Request failed with status {status}"))
}
