//! Wire format types for Solana chain identifiers, addresses, and token deployments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_pubkey::Pubkey;
use t402::chain::{ChainId, DeployedTokenAmount};

/// A Solana chain reference, identified by the first 32 characters of the
/// network's genesis block hash, parsed from a CAIP-2 chain ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolanaChainReference(&'static str);

/// Error returned when a [`ChainId`] is not a known `solana:` reference.
#[derive(Debug, thiserror::Error)]
#[error("not a known solana chain id: {0}")]
pub struct NotSolanaError(String);

impl SolanaChainReference {
    /// Solana mainnet-beta.
    pub const SOLANA: Self = Self("5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp");
    /// Solana devnet.
    pub const SOLANA_DEVNET: Self = Self("EtWTRABZaYq6iMfeYKouRu166VU2xqa1");

    /// Returns the genesis hash prefix identifying this chain.
    #[must_use]
    pub const fn genesis_hash(self) -> &'static str {
        self.0
    }
}

impl TryFrom<&ChainId> for SolanaChainReference {
    type Error = NotSolanaError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace() != "solana" {
            return Err(NotSolanaError(value.to_string()));
        }
        match value.reference() {
            r if r == Self::SOLANA.0 => Ok(Self::SOLANA),
            r if r == Self::SOLANA_DEVNET.0 => Ok(Self::SOLANA_DEVNET),
            _ => Err(NotSolanaError(value.to_string())),
        }
    }
}

impl From<SolanaChainReference> for ChainId {
    fn from(value: SolanaChainReference) -> Self {
        ChainId::new("solana", value.0)
    }
}

impl fmt::Display for SolanaChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "solana:{}", self.0)
    }
}

/// A Solana public key, serialized in base58 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub Pubkey);

impl Address {
    /// Wraps a [`Pubkey`] as an [`Address`].
    #[must_use]
    pub const fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Returns the underlying public key.
    #[must_use]
    pub const fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<Pubkey> for Address {
    fn from(value: Pubkey) -> Self {
        Self(value)
    }
}

impl From<Address> for Pubkey {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = <Pubkey as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pubkey::from_str(s).map(Self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A SPL token mint deployed on a specific Solana chain, for use with
/// [`t402::chain::DeployedTokenAmount`] when building price tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolanaTokenDeployment {
    /// The Solana chain this mint is deployed on.
    pub chain_reference: SolanaChainReference,
    /// The SPL token mint address.
    pub address: Address,
    /// Number of decimals.
    pub decimals: u8,
}

impl SolanaTokenDeployment {
    /// Creates a new token deployment record.
    #[must_use]
    pub const fn new(chain_reference: SolanaChainReference, address: Address, decimals: u8) -> Self {
        Self {
            chain_reference,
            address,
            decimals,
        }
    }

    /// Pairs this deployment with a raw atomic `amount`, ready for
    /// [`crate::exact::V1SolanaExact::price_tag`] / `V2SolanaExact::price_tag`.
    #[must_use]
    pub const fn amount(&self, amount: u64) -> DeployedTokenAmount<u64, Self> {
        DeployedTokenAmount {
            amount,
            token: *self,
        }
    }
}
