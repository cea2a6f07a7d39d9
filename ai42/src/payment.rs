//! Payment records and payment-client configuration.
//!
//! [`PaymentInfo`] is the receipt a paid response carries. [`PaymentRequired`]
//! and [`PaymentPayload`] are the two halves of the 402 handshake, kept
//! scheme-agnostic: the scheme-specific part of a payload is opaque JSON.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::networks::Network;
use crate::signer::Signer;
use crate::wallet::Wallet;

/// Default per-request payment ceiling, in token base units.
pub const DEFAULT_MAX_PAYMENT_AMOUNT: u64 = 1_000_000;

/// Receipt of a settled payment, decoded from the `X-PAYMENT-RESPONSE` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    /// Amount paid, in token base units.
    pub amount: u64,
    /// Recipient address.
    pub recipient: String,
    /// Transaction signature.
    pub signature: String,
    /// Payer wallet address.
    pub wallet: String,
}

/// One acceptable way of paying, as offered by a 402 challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// Payment scheme, e.g. "exact".
    pub scheme: String,
    /// Network name or CAIP-2 chain id.
    pub network: String,
    /// Amount to pay in base units. V2 challenges call it `amount`.
    #[serde(alias = "amount")]
    pub max_amount_required: String,
    /// Recipient address.
    pub pay_to: String,
    /// Token mint or contract address.
    pub asset: String,
    /// Paid resource URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Human-readable description of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// How long a payment authorization stays valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_timeout_seconds: Option<u64>,
    /// Scheme-specific data, e.g. the Solana fee payer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl PaymentRequirements {
    /// Parsed amount, `None` if it is not an unsigned integer.
    #[must_use]
    pub fn amount(&self) -> Option<u128> {
        self.max_amount_required.parse().ok()
    }
}

/// A decoded 402 challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version, 1 or 2.
    pub x402_version: u8,
    /// Acceptable payment options, in server preference order.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    /// Server-provided reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Signed payment sent back with the retried request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    /// Protocol version, echoed from the challenge.
    pub x402_version: u8,
    /// Scheme of the chosen requirement.
    pub scheme: String,
    /// Network of the chosen requirement.
    pub network: String,
    /// The requirement being paid (V2 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<PaymentRequirements>,
    /// Scheme-specific payload, e.g. `{ "transaction": "<base64>" }`.
    pub payload: serde_json::Value,
}

impl PaymentPayload {
    /// Builds the payload answering `requirements` of a version `x402_version` challenge.
    #[must_use]
    pub fn new(
        x402_version: u8,
        requirements: &PaymentRequirements,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            x402_version,
            scheme: requirements.scheme.clone(),
            network: requirements.network.clone(),
            accepted: (x402_version >= 2).then(|| requirements.clone()),
            payload,
        }
    }
}

/// Configuration of a wallet-signed (browser mode) payment client.
#[derive(Clone)]
pub struct BrowserPaymentConfig {
    /// Connected wallet. Required.
    pub wallet: Option<Arc<dyn Wallet>>,
    /// Network payments are made on.
    pub network: Network,
    /// Per-request ceiling. Unset only for direct construction, where the
    /// same [`DEFAULT_MAX_PAYMENT_AMOUNT`] used by [`AI42Config`](crate::AI42Config) applies.
    pub max_payment_amount: Option<u64>,
}

impl BrowserPaymentConfig {
    /// Effective per-request ceiling.
    #[must_use]
    pub fn max_payment_amount(&self) -> u64 {
        self.max_payment_amount.unwrap_or(DEFAULT_MAX_PAYMENT_AMOUNT)
    }
}

impl fmt::Debug for BrowserPaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserPaymentConfig")
            .field("wallet", &self.wallet.as_ref().map(|w| w.public_key()))
            .field("network", &self.network)
            .field("max_payment_amount", &self.max_payment_amount)
            .finish()
    }
}

/// Configuration of a signer-backed (server mode) payment client.
#[derive(Clone)]
pub struct ServerPaymentConfig {
    /// Held signer. Required.
    pub signer: Option<Arc<dyn Signer>>,
    /// Network payments are made on.
    pub network: Network,
    /// Per-request ceiling. Unset only for direct construction, where the
    /// same [`DEFAULT_MAX_PAYMENT_AMOUNT`] used by [`AI42Config`](crate::AI42Config) applies.
    pub max_payment_amount: Option<u64>,
}

impl ServerPaymentConfig {
    /// Effective per-request ceiling.
    #[must_use]
    pub fn max_payment_amount(&self) -> u64 {
        self.max_payment_amount.unwrap_or(DEFAULT_MAX_PAYMENT_AMOUNT)
    }
}

impl fmt::Debug for ServerPaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The signer is opaque and never printed.
        f.debug_struct("ServerPaymentConfig")
            .field("signer", &self.signer.as_ref().map(|_| "<signer>"))
            .field("network", &self.network)
            .field("max_payment_amount", &self.max_payment_amount)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_amount_alias_is_accepted() {
        let requirements: PaymentRequirements = serde_json::from_value(serde_json::json!({
            "scheme": "exact",
            "network": "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
            "amount": "2500",
            "payTo": "recipient",
            "asset": "mint"
        }))
        .unwrap();
        assert_eq!(requirements.amount(), Some(2500));
        assert!(requirements.extra.is_none());
    }

    #[test]
    fn payload_embeds_requirements_only_for_v2() {
        let requirements = PaymentRequirements {
            scheme: "exact".into(),
            network: "solana-devnet".into(),
            max_amount_required: "10".into(),
            pay_to: "recipient".into(),
            asset: "mint".into(),
            resource: None,
            description: None,
            mime_type: None,
            max_timeout_seconds: Some(60),
            extra: None,
        };
        let payload = serde_json::json!({ "transaction": "AAAA" });

        let v1 = PaymentPayload::new(1, &requirements, payload.clone());
        assert!(v1.accepted.is_none());
        let json = serde_json::to_value(&v1).unwrap();
        assert_eq!(json["x402Version"], 1);
        assert!(json.get("accepted").is_none());

        let v2 = PaymentPayload::new(2, &requirements, payload);
        assert_eq!(v2.accepted.as_ref(), Some(&requirements));
    }

    #[test]
    fn direct_configs_share_the_facade_default() {
        let config = crate::AI42Config::parse("https://api.ai42.example").unwrap();
        let browser = BrowserPaymentConfig {
            wallet: None,
            network: config.network(),
            max_payment_amount: None,
        };
        assert_eq!(browser.max_payment_amount(), config.max_payment_amount());
    }

    #[test]
    fn ceiling_defaults_when_unset() {
        let config = ServerPaymentConfig {
            signer: None,
            network: Network::SolanaMainnet,
            max_payment_amount: None,
        };
        assert_eq!(config.max_payment_amount(), DEFAULT_MAX_PAYMENT_AMOUNT);
        assert_eq!(
            ServerPaymentConfig {
                max_payment_amount: Some(5),
                ..config
            }
            .max_payment_amount(),
            5
        );
    }
}
