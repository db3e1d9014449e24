//! Decimal amount helpers.
//!
//! Native amounts travel as integer strings in the currency's smallest unit;
//! display and fiat amounts are [`Decimal`]s. Nothing here goes through
//! floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid amount: {0:?}")]
    Invalid(String),

    #[error("conversion rate must be greater than zero")]
    NonPositiveRate,

    #[error("amount out of range")]
    Overflow,
}

/// Parse a decimal string, rejecting anything that is not a plain number.
pub fn parse_decimal(value: &str) -> Result<Decimal, AmountError> {
    Decimal::from_str(value.trim()).map_err(|_| AmountError::Invalid(value.to_string()))
}

/// Exact product of two decimal strings.
pub fn mul_decimal_str(a: &str, b: &str) -> Result<Decimal, AmountError> {
    parse_decimal(a)?
        .checked_mul(parse_decimal(b)?)
        .ok_or(AmountError::Overflow)
}

/// Normalize user-typed amount text before validation.
///
/// Whitespace and `_` grouping are removed. A lone `,` is read as the
/// decimal separator; when a `.` is also present, commas are grouping.
pub fn sanitize_input(raw: &str) -> String {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    if compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replacen(',', ".", 1).replace(',', "")
    }
}

/// `Some` only for finite, non-negative numbers.
pub fn parse_non_negative(value: &str) -> Option<Decimal> {
    if value.is_empty() {
        return None;
    }
    let parsed = Decimal::from_str(value).ok()?;
    (!parsed.is_sign_negative() || parsed.is_zero()).then_some(parsed)
}

/// Fiat value of `crypto` at `fiat_per_crypto`, rounded to `dp` places.
pub fn fiat_from_crypto(
    crypto: Decimal,
    fiat_per_crypto: Decimal,
    dp: u32,
) -> Result<Decimal, AmountError> {
    if fiat_per_crypto <= Decimal::ZERO {
        return Err(AmountError::NonPositiveRate);
    }
    let fiat = crypto
        .checked_mul(fiat_per_crypto)
        .ok_or(AmountError::Overflow)?;
    Ok(fiat
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .normalize())
}

/// Crypto value of `fiat` at `fiat_per_crypto`, rounded to `dp` places.
pub fn crypto_from_fiat(
    fiat: Decimal,
    fiat_per_crypto: Decimal,
    dp: u32,
) -> Result<Decimal, AmountError> {
    if fiat_per_crypto <= Decimal::ZERO {
        return Err(AmountError::NonPositiveRate);
    }
    let crypto = fiat
        .checked_div(fiat_per_crypto)
        .ok_or(AmountError::Overflow)?;
    Ok(crypto
        .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
        .normalize())
}

/// Display amount (`"1.5"`) to smallest-unit integer string (`"150000000"`).
///
/// Digits beyond the currency's precision are truncated.
pub fn exchange_to_native(amount: &str, multiplier: &str) -> Result<String, AmountError> {
    let native = mul_decimal_str(amount, multiplier)?.trunc();
    if native.is_sign_negative() && !native.is_zero() {
        return Err(AmountError::Invalid(amount.to_string()));
    }
    Ok(native.normalize().to_string())
}

/// Smallest-unit integer string to display amount.
pub fn native_to_exchange(native: &str, multiplier: &str) -> Result<Decimal, AmountError> {
    let multiplier = parse_decimal(multiplier)?;
    if multiplier <= Decimal::ZERO {
        return Err(AmountError::NonPositiveRate);
    }
    parse_decimal(native)?
        .checked_div(multiplier)
        .map(|d| d.normalize())
        .ok_or(AmountError::Overflow)
}

/// Canonical string form: no trailing zeros, no exponent.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_fiat_product_is_exact() {
        assert_eq!(mul_decimal_str("1", "1.77345").unwrap(), dec("1.77345"));
        assert_eq!(mul_decimal_str("0.1", "0.2").unwrap(), dec("0.02"));
        assert!(mul_decimal_str("abc", "1").is_err());
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input(" 1.5 "), "1.5");
        assert_eq!(sanitize_input("1,5"), "1.5");
        assert_eq!(sanitize_input("1,000.25"), "1000.25");
        assert_eq!(sanitize_input("1 000_000"), "1000000");
    }

    #[test]
    fn test_parse_non_negative() {
        assert_eq!(parse_non_negative("2.5"), Some(dec("2.5")));
        assert_eq!(parse_non_negative("0"), Some(Decimal::ZERO));
        assert_eq!(parse_non_negative("-5"), None);
        assert_eq!(parse_non_negative("five"), None);
        assert_eq!(parse_non_negative(""), None);
    }

    #[test]
    fn test_fiat_crypto_conversion() {
        let rate = dec("1.77345");
        assert_eq!(fiat_from_crypto(dec("2"), rate, 2).unwrap(), dec("3.55"));
        assert_eq!(
            crypto_from_fiat(dec("3.54690"), rate, 8).unwrap(),
            dec("2")
        );
        assert_eq!(
            crypto_from_fiat(dec("1"), Decimal::ZERO, 8),
            Err(AmountError::NonPositiveRate)
        );
    }

    #[test]
    fn test_native_unit_conversion() {
        assert_eq!(exchange_to_native("1.5", "100000000").unwrap(), "150000000");
        assert_eq!(exchange_to_native("0.000000019", "100000000").unwrap(), "1");
        assert_eq!(
            native_to_exchange("150000000", "100000000").unwrap(),
            dec("1.5")
        );
    }
}
