//! Injected wallet adapter.
//!
//! Browser hosts expose a wallet (Phantom) on a well-known slot. Instead of
//! reading ambient globals, the host is passed in explicitly as a
//! [`WalletHost`], so any environment, including tests, can provide one.
//!
//! A wallet's connection state is never cached here: a wallet without a
//! public key is disconnected, whatever else it reports.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use solana_pubkey::Pubkey;
#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::{BoxError, Error, Result};

/// Slot under which hosts expose the injected wallet.
pub const INJECTED_WALLET_KEY: &str = "solana";

/// Where Phantom can be installed from.
pub const PHANTOM_INSTALL_URL: &str = "https://phantom.app";

/// A wallet capability supplied by the host environment.
///
/// Transactions travel as serialized bytes; the wallet returns them signed.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Public key, `None` until connected.
    fn public_key(&self) -> Option<Pubkey>;

    /// Connection flag as reported by the wallet itself.
    fn is_connected(&self) -> bool;

    /// Whether this wallet identifies itself as Phantom.
    fn is_phantom(&self) -> bool {
        false
    }

    /// Runs the wallet's own connect handshake.
    async fn connect(&self) -> Result<(), BoxError>;

    /// Disconnects the wallet.
    async fn disconnect(&self) -> Result<(), BoxError>;

    /// Signs one serialized transaction.
    async fn sign_transaction(&self, transaction: Vec<u8>) -> Result<Vec<u8>, BoxError>;

    /// Signs several serialized transactions, in order.
    async fn sign_all_transactions(
        &self,
        transactions: Vec<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, BoxError> {
        let mut signed = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            signed.push(self.sign_transaction(transaction).await?);
        }
        Ok(signed)
    }
}

/// A browser-like environment that may carry injected wallets.
pub trait WalletHost: Send + Sync + Debug {
    /// The wallet injected under `key`, if any.
    fn injected_wallet(&self, key: &str) -> Option<Arc<dyn Wallet>>;
}

/// Connects the Phantom wallet injected into `host`.
///
/// `host` is `None` outside browser-like environments.
///
/// # Errors
///
/// Returns [`ErrorKind::PaymentFailed`](crate::ErrorKind::PaymentFailed) if
/// there is no host, no injected Phantom wallet, the wallet refuses to
/// connect, or it is still without a public key after connecting.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "ai42.wallet.connect", skip_all, err)
)]
pub async fn connect_wallet(host: Option<&dyn WalletHost>) -> Result<Arc<dyn Wallet>> {
    let host = host.ok_or_else(|| {
        Error::payment_failed("Phantom wallet is only available in browser environments")
    })?;

    let wallet = host
        .injected_wallet(INJECTED_WALLET_KEY)
        .filter(|wallet| wallet.is_phantom())
        .ok_or_else(|| {
            Error::payment_failed(format!(
                "Phantom wallet not found. Please install it from {PHANTOM_INSTALL_URL}"
            ))
        })?;

    wallet.connect().await.map_err(|e| {
        Error::payment_failed(format!("Failed to connect to Phantom: {e}")).with_source(e)
    })?;

    if wallet.public_key().is_none() {
        return Err(Error::payment_failed("Failed to connect wallet"));
    }

    #[cfg(feature = "telemetry")]
    debug!(address = ?wallet.public_key(), "Wallet connected");

    Ok(wallet)
}

/// Base58 address of a connected wallet.
///
/// # Errors
///
/// Returns [`ErrorKind::PaymentFailed`](crate::ErrorKind::PaymentFailed) if
/// the wallet has no public key.
pub fn wallet_address(wallet: &dyn Wallet) -> Result<String> {
    wallet
        .public_key()
        .map(|key| key.to_string())
        .ok_or_else(|| Error::payment_failed("Wallet not connected"))
}
