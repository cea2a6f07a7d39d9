#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport and payment clients for the AI42 inference SDK.
//!
//! [`AI42Client`] sends chat requests through a [`PaymentClient`], which
//! answers the API's 402 challenges before handing back the final response.
//!
//! # Modules
//!
//! - [`chat`] - The [`AI42Client`] facade
//! - [`client`] - Browser (wallet) and server (signer) payment clients
//! - [`fetch`] - Payment-aware fetches and the built-in x402 middleware
//! - [`headers`] - Encoding and decoding of payment headers
//! - [`constants`] - Payment header names
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod chat;
pub mod client;
pub mod constants;
pub mod fetch;
pub mod headers;

#[cfg(test)]
mod testing;

pub use chat::AI42Client;
pub use client::{BrowserPaymentClient, InitState, PaymentClient, ServerPaymentClient};
pub use fetch::{
    PaymentFetch, SignerFetchFactory, TransactionBuilder, WalletFetchFactory, X402FetchFactory,
};
