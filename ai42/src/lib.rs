#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the AI42 inference SDK.
//!
//! AI42 serves chat completions behind HTTP 402: each request is paid with an
//! on-chain micropayment. This crate holds everything that does not touch the
//! network: the error taxonomy, the chat wire types, payment networks and
//! payment records, configuration, and the wallet and signer capabilities
//! that authorize payments. The HTTP side lives in `ai42-http`.
//!
//! # Modules
//!
//! - [`chat`] - Chat request and response types
//! - [`config`] - Client configuration and environment loading
//! - [`encoding`] - Base64 JSON envelopes used by payment headers
//! - [`error`] - The uniform [`Error`] type
//! - [`networks`] - Supported payment networks
//! - [`payment`] - Payment receipts, challenges and client configuration
//! - [`signer`] - Held signer capability (server mode)
//! - [`wallet`] - Injected wallet adapter (browser mode)
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod chat;
pub mod config;
pub mod encoding;
pub mod error;
pub mod networks;
pub mod payment;
pub mod signer;
pub mod wallet;

pub use chat::{ChatRequest, ChatResponse, ModelIdentifier, ModelProvider, Priority, TokenUsage};
pub use config::AI42Config;
pub use error::{ApiError, BoxError, Error, ErrorDetails, ErrorKind, Result};
pub use networks::Network;
pub use payment::{
    BrowserPaymentConfig, DEFAULT_MAX_PAYMENT_AMOUNT, PaymentInfo, PaymentPayload,
    PaymentRequired, PaymentRequirements, ServerPaymentConfig,
};
pub use signer::Signer;
pub use wallet::{Wallet, WalletHost, connect_wallet, wallet_address};
