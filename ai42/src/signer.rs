//! Held signer capability for unattended (server mode) payments.

use async_trait::async_trait;

use crate::error::BoxError;
use crate::payment::PaymentRequirements;

/// An opaque credential able to authorize payments without user interaction.
///
/// The SDK never looks inside a signer. It hands the signer the requirement
/// it picked from a 402 challenge and forwards whatever scheme payload comes
/// back (for Solana "exact": `{ "transaction": "<base64>" }`).
#[async_trait]
pub trait Signer: Send + Sync {
    /// Produces the scheme-specific payload paying `requirements`.
    async fn sign_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<serde_json::Value, BoxError>;
}
