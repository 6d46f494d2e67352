//! Server-side scheme abstractions for t402 payment handling.
//!
//! This module provides the trait that resource servers use to convert
//! human-readable prices into token amounts and enrich payment requirements
//! with scheme-specific data.

use crate::chain::ChainId;
use crate::proto::v2;
use serde_json::Value;
use std::sync::Arc;

/// Boxed error type returned by server-side scheme operations.
///
/// `Send + Sync` so it can cross `.await` points inside the payment gate.
pub type SchemeError = Box<dyn std::error::Error + Send + Sync>;

/// A resolved token amount ready for use in payment requirements.
#[derive(Debug, Clone)]
pub struct AssetAmount {
    /// The token contract address.
    pub asset: String,
    /// The amount in the token's smallest unit (e.g., "10000" for 0.01 USDC).
    pub amount: String,
    /// Scheme-specific extras produced while resolving the amount (e.g.
    /// EIP-712 domain parameters), merged into the requirement's `extra`.
    pub extra: Option<Value>,
}

/// A money parser converts a human-readable price (e.g. `"$0.001"`) into an
/// [`AssetAmount`] for a given network.
///
/// Parsers are tried in registration order; the first one to return
/// `Some(_)` wins, matching the "first non-null result wins" rule for
/// chained money-parser fallbacks.
pub trait MoneyParser: Send + Sync {
    /// Attempts to parse `price` for `network`. Returns `None` if this
    /// parser does not recognize the price format, letting the next
    /// registered parser take a turn.
    fn parse(&self, price: &Value, network: &ChainId) -> Option<Result<AssetAmount, SchemeError>>;
}

/// Trait for server-side scheme processing.
///
/// Implementations convert human-readable prices into protocol-level
/// payment requirements. This allows resource servers to specify prices
/// as `"$0.01"` instead of manually constructing the full
/// [`v2::PaymentRequirements`] with raw token amounts.
///
/// # Relationship to Other Traits
///
/// - [`Facilitator`](crate::facilitator::Facilitator) — facilitator-side: verify and settle payments
/// - [`super::T402SchemeClient`] — client-side: generate payment candidates
/// - **`SchemeServer`** — server-side: build payment requirements
pub trait SchemeServer: super::T402SchemeId + Send + Sync {
    /// Converts a price (a pre-resolved `{asset, amount}` object or a money
    /// string such as `"$0.01"`) into a token amount for the given network.
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed or the network is not
    /// supported by this handler.
    fn parse_price(&self, price: &Value, network: &ChainId) -> Result<AssetAmount, SchemeError>;

    /// Enriches base payment requirements with scheme-specific data.
    ///
    /// Called after [`parse_price`](Self::parse_price) to add any extra
    /// fields needed by the scheme (e.g., fee payer addresses, nonce
    /// parameters). The default implementation returns the requirements
    /// unchanged.
    fn enhance_requirements(
        &self,
        requirements: v2::PaymentRequirements,
    ) -> v2::PaymentRequirements {
        requirements
    }

    /// Registers an additional money parser for this scheme. Parsers are
    /// consulted in registration order before the scheme's built-in
    /// conversion logic. Optional — the default implementation is a no-op,
    /// matching schemes that have no use for chained money parsers.
    fn register_money_parser(&mut self, _parser: Arc<dyn MoneyParser>) {}

    /// Builds complete [`v2::PaymentRequirements`] from a price, combining
    /// [`parse_price`](Self::parse_price) and
    /// [`enhance_requirements`](Self::enhance_requirements).
    ///
    /// # Errors
    ///
    /// Returns an error if the price cannot be parsed or the network is not
    /// supported.
    fn build_requirements(
        &self,
        price: &Value,
        network: &ChainId,
        pay_to: &str,
        max_timeout_seconds: u64,
    ) -> Result<v2::PaymentRequirements, SchemeError> {
        let asset_amount = self.parse_price(price, network)?;
        let base = v2::PaymentRequirements {
            scheme: self.scheme().to_owned(),
            network: network.clone(),
            amount: asset_amount.amount,
            pay_to: pay_to.to_owned(),
            max_timeout_seconds,
            asset: asset_amount.asset,
            extra: asset_amount.extra,
        };
        Ok(self.enhance_requirements(base))
    }
}
