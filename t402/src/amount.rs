//! Human-readable currency amount parsing.
//!
//! Prices in the protocol may be expressed either as a pre-resolved
//! `{asset, amount}` pair or as a human-readable money string like
//! `"$0.001"`. This module converts the latter into atomic token units
//! given a token's decimal precision.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Errors raised while parsing or converting a money amount.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AmountParseError {
    /// The input string is not a recognized decimal money value.
    #[error("not a recognized money string: {0}")]
    InvalidFormat(String),
    /// Scaling the amount to atomic units overflowed.
    #[error("amount exceeds representable atomic units")]
    Overflow,
}

/// Parses a money string such as `"$0.001"` or `"1.50"` into a [`Decimal`].
///
/// A leading `$` is stripped; surrounding whitespace is ignored. Other
/// currency symbols are rejected since prices in this protocol are always
/// USD-denominated stablecoin amounts.
///
/// # Errors
///
/// Returns [`AmountParseError::InvalidFormat`] if `input` is not a decimal
/// number once the optional `$` prefix is removed.
pub fn parse_money(input: &str) -> Result<Decimal, AmountParseError> {
    let trimmed = input.trim().strip_prefix('$').unwrap_or(input.trim());
    Decimal::from_str(trimmed).map_err(|_| AmountParseError::InvalidFormat(input.to_owned()))
}

/// Converts a decimal money amount into an atomic integer amount string for
/// a token with `decimals` fractional digits (e.g. `6` for USDC).
///
/// Amounts that don't divide evenly into atomic units are rounded to the
/// nearest whole unit.
///
/// # Errors
///
/// Returns [`AmountParseError::Overflow`] if scaling by `10^decimals`
/// overflows `Decimal`'s representable range.
pub fn to_atomic_units(amount: Decimal, decimals: u8) -> Result<String, AmountParseError> {
    let scale = Decimal::from(10u64.pow(u32::from(decimals)));
    let atomic = amount
        .checked_mul(scale)
        .ok_or(AmountParseError::Overflow)?
        .round_dp(0);
    Ok(atomic.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_prefixed_strings() {
        assert_eq!(parse_money("$0.001").unwrap(), Decimal::new(1, 3));
        assert_eq!(parse_money("1.50").unwrap(), Decimal::new(150, 2));
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert!(parse_money("free").is_err());
    }

    #[test]
    fn converts_to_atomic_units() {
        let amount = parse_money("$1.50").unwrap();
        assert_eq!(to_atomic_units(amount, 6).unwrap(), "1500000");
    }

    #[test]
    fn rounds_sub_atomic_fractions() {
        let amount = parse_money("$0.0000005").unwrap();
        assert_eq!(to_atomic_units(amount, 6).unwrap(), "1");
    }
}
