//! Shared fakes for the unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ai42::{BoxError, PaymentRequired, PaymentRequirements, Signer, Wallet};
use async_trait::async_trait;
use solana_pubkey::Pubkey;

use crate::fetch::TransactionBuilder;

pub const RECIPIENT: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const USDC_DEVNET: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";

pub fn requirement(network: &str, amount: &str) -> PaymentRequirements {
    PaymentRequirements {
        scheme: "exact".into(),
        network: network.into(),
        max_amount_required: amount.into(),
        pay_to: RECIPIENT.into(),
        asset: USDC_DEVNET.into(),
        resource: None,
        description: None,
        mime_type: None,
        max_timeout_seconds: Some(60),
        extra: None,
    }
}

pub fn challenge_v1(amount: &str) -> PaymentRequired {
    PaymentRequired {
        x402_version: 1,
        accepts: vec![requirement("solana-devnet", amount)],
        error: Some("X-PAYMENT header is required".into()),
    }
}

/// Signs every requirement with a fixed payload and counts the calls.
#[derive(Debug, Default)]
pub struct CountingSigner {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Signer for CountingSigner {
    async fn sign_payment(
        &self,
        _requirements: &PaymentRequirements,
    ) -> Result<serde_json::Value, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({ "transaction": "c2lnbmVk" }))
    }
}

/// Connected wallet that appends its key's first byte to what it signs.
#[derive(Debug)]
pub struct FakeWallet {
    pub key: Pubkey,
    pub signed: Mutex<Vec<Vec<u8>>>,
}

impl FakeWallet {
    pub fn new() -> Self {
        Self {
            key: Pubkey::new_from_array([3; 32]),
            signed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn public_key(&self) -> Option<Pubkey> {
        Some(self.key)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn is_phantom(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn sign_transaction(&self, mut transaction: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        self.signed.lock().unwrap().push(transaction.clone());
        transaction.push(self.key.to_bytes()[0]);
        Ok(transaction)
    }
}

/// Builds a transfer encoding nothing but the amount.
#[derive(Debug, Default)]
pub struct AmountBuilder;

#[async_trait]
impl TransactionBuilder for AmountBuilder {
    async fn build_transfer(
        &self,
        _payer: &Pubkey,
        requirements: &PaymentRequirements,
    ) -> Result<Vec<u8>, BoxError> {
        Ok(requirements.max_amount_required.as_bytes().to_vec())
    }
}
