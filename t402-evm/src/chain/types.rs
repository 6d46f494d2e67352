//! Wire format types for EIP-155 chain identifiers, token amounts, and addresses.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use t402::chain::ChainId;

/// A numeric EIP-155 chain reference (e.g., `8453` for Base), parsed from a CAIP-2 chain ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eip155ChainReference(u64);

/// Error returned when a [`ChainId`] is not a valid `eip155:` reference.
#[derive(Debug, thiserror::Error)]
#[error("not an eip155 chain id: {0}")]
pub struct NotEip155Error(String);

impl TryFrom<&ChainId> for Eip155ChainReference {
    type Error = NotEip155Error;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace() != "eip155" {
            return Err(NotEip155Error(value.to_string()));
        }
        value
            .reference()
            .parse()
            .map(Self)
            .map_err(|_| NotEip155Error(value.to_string()))
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        ChainId::new("eip155", value.0.to_string())
    }
}

impl From<Eip155ChainReference> for u64 {
    fn from(value: Eip155ChainReference) -> Self {
        value.0
    }
}

impl Eip155ChainReference {
    /// Returns the numeric chain ID.
    #[must_use]
    pub const fn inner(self) -> u64 {
        self.0
    }
}

impl From<u64> for Eip155ChainReference {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Eip155ChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "eip155:{}", self.0)
    }
}

/// A token amount in the asset's smallest unit (e.g., wei, or USDC's 6-decimal atomic units).
///
/// Serializes as a decimal string to avoid precision loss for values exceeding
/// JSON's safe integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenAmount(pub U256);

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = <U256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str(s).map(Self)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// An EVM address serialized in EIP-55 checksummed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksummedAddress(pub Address);

impl From<Address> for ChecksummedAddress {
    fn from(value: Address) -> Self {
        Self(value)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

impl fmt::Display for ChecksummedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl FromStr for ChecksummedAddress {
    type Err = <Address as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_str(s).map(Self)
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// EIP-712 domain parameters for a token deployment (the `name`/`version`
/// used when constructing the typed-data domain for signature verification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDeploymentEip712 {
    /// EIP-712 domain name (e.g., `"USD Coin"`).
    pub name: String,
    /// EIP-712 domain version (e.g., `"2"`).
    pub version: String,
}

/// A token deployment bound to a specific EVM chain, for use with
/// [`t402::chain::DeployedTokenAmount`] when building price tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTokenDeployment {
    /// The EIP-155 chain this token is deployed on.
    pub chain_reference: Eip155ChainReference,
    /// The token contract address.
    pub address: Address,
    /// Number of decimals.
    pub decimals: u8,
    /// EIP-712 domain name for the token contract.
    pub name: String,
    /// EIP-712 domain version for the token contract.
    pub version: String,
}
