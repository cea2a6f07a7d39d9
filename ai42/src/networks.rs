//! Payment networks a client can be bound to.
//!
//! The SDK names networks the way the inference API does (`solana-devnet`),
//! while payment challenges may use the x402 V1 name (`solana-devnet`,
//! `solana`) or a CAIP-2 chain id (`solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1`).
//! [`Network::matches`] accepts all of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Static metadata of a supported network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// SDK-facing name (e.g. "solana-mainnet").
    pub name: &'static str,
    /// x402 V1 network name (e.g. "solana").
    pub v1_name: &'static str,
    /// CAIP-2 namespace (e.g. "solana", "eip155").
    pub namespace: &'static str,
    /// CAIP-2 chain reference.
    pub reference: &'static str,
}

impl NetworkInfo {
    /// CAIP-2 chain id, `namespace:reference`.
    #[must_use]
    pub fn chain_id(&self) -> String {
        format!("{}:{}", self.namespace, self.reference)
    }
}

/// Every network the SDK can pay on.
pub static NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "solana-mainnet",
        v1_name: "solana",
        namespace: "solana",
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
    },
    NetworkInfo {
        name: "solana-devnet",
        v1_name: "solana-devnet",
        namespace: "solana",
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
    },
    NetworkInfo {
        name: "base-sepolia",
        v1_name: "base-sepolia",
        namespace: "eip155",
        reference: "84532",
    },
];

/// A payment network. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Network {
    /// Solana mainnet-beta.
    #[serde(rename = "solana-mainnet")]
    SolanaMainnet,
    /// Solana devnet. Default test network.
    #[default]
    #[serde(rename = "solana-devnet")]
    SolanaDevnet,
    /// Base Sepolia testnet.
    #[serde(rename = "base-sepolia")]
    BaseSepolia,
}

impl Network {
    /// The network used when the caller does not pick one.
    pub const DEFAULT: Self = Self::SolanaDevnet;

    /// Static metadata for this network.
    #[must_use]
    pub fn info(self) -> &'static NetworkInfo {
        match self {
            Self::SolanaMainnet => &NETWORKS[0],
            Self::SolanaDevnet => &NETWORKS[1],
            Self::BaseSepolia => &NETWORKS[2],
        }
    }

    /// SDK-facing name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    /// `true` for Solana networks.
    #[must_use]
    pub const fn is_solana(self) -> bool {
        matches!(self, Self::SolanaMainnet | Self::SolanaDevnet)
    }

    /// Whether `network`, as found in a payment challenge, designates this network.
    #[must_use]
    pub fn matches(self, network: &str) -> bool {
        let info = self.info();
        network == info.name || network == info.v1_name || network == info.chain_id()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no supported network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::SolanaMainnet, Self::SolanaDevnet, Self::BaseSepolia]
            .into_iter()
            .find(|network| network.matches(s))
            .ok_or_else(|| UnknownNetwork(s.to_owned()))
    }
}
