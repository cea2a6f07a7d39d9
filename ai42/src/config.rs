//! SDK configuration.
//!
//! # Environment Variables
//!
//! - `AI42_API_URL` - base URL of the inference API (required)
//! - `AI42_NETWORK` - payment network, default `solana-devnet`
//! - `AI42_MAX_PAYMENT_AMOUNT` - per-request ceiling in base units, default `1000000`

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::networks::Network;
use crate::payment::DEFAULT_MAX_PAYMENT_AMOUNT;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "AI42_API_URL";
/// Environment variable holding the payment network.
pub const ENV_NETWORK: &str = "AI42_NETWORK";
/// Environment variable holding the payment ceiling.
pub const ENV_MAX_PAYMENT_AMOUNT: &str = "AI42_MAX_PAYMENT_AMOUNT";

/// Top-level client configuration.
///
/// Unset fields fall back to [`Network::DEFAULT`] and
/// [`DEFAULT_MAX_PAYMENT_AMOUNT`]. The facade resolves both here and hands
/// explicit values to the payment clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AI42Config {
    /// Base URL of the inference API.
    pub api_url: Url,

    /// Payment network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,

    /// Per-request payment ceiling, in token base units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payment_amount: Option<u64>,
}

impl AI42Config {
    /// Creates a configuration with default network and ceiling.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            network: None,
            max_payment_amount: None,
        }
    }

    /// Parses `api_url` and creates a configuration from it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidRequest`](crate::ErrorKind::InvalidRequest)
    /// if the URL does not parse.
    pub fn parse(api_url: &str) -> Result<Self> {
        let api_url = Url::parse(api_url).map_err(|e| {
            Error::invalid_request(format!("Invalid API URL {api_url:?}: {e}")).with_source(e)
        })?;
        Ok(Self::new(api_url))
    }

    /// Sets the payment network.
    #[must_use]
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets the per-request payment ceiling.
    #[must_use]
    pub fn with_max_payment_amount(mut self, amount: u64) -> Self {
        self.max_payment_amount = Some(amount);
        self
    }

    /// Effective payment network.
    #[must_use]
    pub fn network(&self) -> Network {
        self.network.unwrap_or(Network::DEFAULT)
    }

    /// Effective payment ceiling.
    #[must_use]
    pub fn max_payment_amount(&self) -> u64 {
        self.max_payment_amount.unwrap_or(DEFAULT_MAX_PAYMENT_AMOUNT)
    }

    /// URL of the chat endpoint, `{api_url}/chat`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidRequest`](crate::ErrorKind::InvalidRequest)
    /// if the base URL cannot carry a path.
    pub fn chat_url(&self) -> Result<Url> {
        let base = self.api_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/chat")).map_err(|e| {
            Error::invalid_request(format!("Invalid chat URL for {base}: {e}")).with_source(e)
        })
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidRequest`](crate::ErrorKind::InvalidRequest)
    /// if `AI42_API_URL` is missing or any variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup(ENV_API_URL)
            .ok_or_else(|| Error::invalid_request(format!("{ENV_API_URL} is not set")))?;
        let mut config = Self::parse(&api_url)?;

        if let Some(network) = lookup(ENV_NETWORK) {
            let network = network.parse::<Network>().map_err(|e| {
                Error::invalid_request(format!("{ENV_NETWORK}: {e}")).with_source(e)
            })?;
            config = config.with_network(network);
        }

        if let Some(amount) = lookup(ENV_MAX_PAYMENT_AMOUNT) {
            let amount = amount.trim().parse::<u64>().map_err(|e| {
                Error::invalid_request(format!("{ENV_MAX_PAYMENT_AMOUNT}: {e}")).with_source(e)
            })?;
            config = config.with_max_payment_amount(amount);
        }

        Ok(config)
    }
}
