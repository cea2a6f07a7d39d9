//! Turning a selected payment requirement into a signed scheme payload.

use std::sync::Arc;

use ai42::encoding::encode_bytes;
use ai42::{BoxError, Error, PaymentRequirements, Result, Signer, Wallet};
use async_trait::async_trait;
use solana_pubkey::Pubkey;
#[cfg(feature = "telemetry")]
use tracing::debug;

/// Authorizes the payment of one requirement.
#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    /// Returns the scheme-specific payload paying `requirements`.
    ///
    /// # Errors
    ///
    /// Failures are reported as [`ErrorKind::PaymentFailed`](ai42::ErrorKind::PaymentFailed).
    async fn authorize(&self, requirements: &PaymentRequirements) -> Result<serde_json::Value>;
}

/// Produces unsigned payment transfers for a wallet to sign.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    /// Serialized, unsigned transaction moving the required amount from `payer`.
    async fn build_transfer(
        &self,
        payer: &Pubkey,
        requirements: &PaymentRequirements,
    ) -> Result<Vec<u8>, BoxError>;
}

/// Wraps a collaborator failure as `PaymentFailed`, keeping SDK errors intact.
fn payment_failed(error: BoxError, context: &str) -> Error {
    match error.downcast::<Error>() {
        Ok(error) => *error,
        Err(other) => Error::payment_failed(format!("{context}: {other}")).with_source(other),
    }
}

/// Authorizes payments with a held [`Signer`].
#[derive(Clone)]
pub struct SignerAuthorizer {
    signer: Arc<dyn Signer>,
}

impl SignerAuthorizer {
    /// Creates an authorizer delegating to `signer`.
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>) -> Self {
        Self { signer }
    }
}

impl std::fmt::Debug for SignerAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerAuthorizer").finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentAuthorizer for SignerAuthorizer {
    async fn authorize(&self, requirements: &PaymentRequirements) -> Result<serde_json::Value> {
        self.signer
            .sign_payment(requirements)
            .await
            .map_err(|e| payment_failed(e, "Signer could not authorize payment"))
    }
}

/// Authorizes payments by having a [`Wallet`] sign a built transfer.
#[derive(Clone)]
pub struct WalletAuthorizer {
    wallet: Arc<dyn Wallet>,
    builder: Arc<dyn TransactionBuilder>,
}

impl WalletAuthorizer {
    /// Creates an authorizer for `wallet`, using `builder` for the transfers.
    #[must_use]
    pub fn new(wallet: Arc<dyn Wallet>, builder: Arc<dyn TransactionBuilder>) -> Self {
        Self { wallet, builder }
    }
}

impl std::fmt::Debug for WalletAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletAuthorizer")
            .field("wallet", &self.wallet.public_key())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentAuthorizer for WalletAuthorizer {
    async fn authorize(&self, requirements: &PaymentRequirements) -> Result<serde_json::Value> {
        // Read on every payment: the host may disconnect the wallet at any time.
        let payer = self
            .wallet
            .public_key()
            .ok_or_else(|| Error::payment_failed("Wallet not connected"))?;

        let unsigned = self
            .builder
            .build_transfer(&payer, requirements)
            .await
            .map_err(|e| payment_failed(e, "Failed to build payment transaction"))?;

        let signed = self
            .wallet
            .sign_transaction(unsigned)
            .await
            .map_err(|e| payment_failed(e, "Wallet failed to sign payment"))?;

        #[cfg(feature = "telemetry")]
        debug!(payer = %payer, bytes = signed.len(), "Wallet signed payment transaction");

        Ok(serde_json::json!({ "transaction": encode_bytes(signed) }))
    }
}
