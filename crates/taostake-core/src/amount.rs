//! Conversion between user-facing decimal strings and base-unit integers.
//!
//! All on-chain quantities are [`Balance`] base units. Decimal strings only
//! exist at the presentation boundary: parsing floors extra fractional digits,
//! formatting truncates.

use thiserror::Error;

use crate::types::Balance;

/// Denomination of the native token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUnits {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenUnits {
    /// Number of fractional digits of TAO.
    pub const TAO_DECIMALS: u8 = 9;

    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }

    /// The native token of every supported network.
    pub fn tao() -> Self {
        Self::new("TAO", Self::TAO_DECIMALS)
    }

    /// Base units in one display unit.
    pub fn one(&self) -> Balance {
        10u128.pow(u32::from(self.decimals))
    }
}

impl Default for TokenUnits {
    fn default() -> Self {
        Self::tao()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Enter a valid amount")]
    Invalid,

    #[error("Amount is too large")]
    Overflow,
}

/// Parse a non-negative decimal string into base units, rounding toward zero.
pub fn parse_amount(input: &str, units: &TokenUnits) -> Result<Balance, AmountError> {
    let input = input.trim();
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Invalid);
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Invalid);
    }

    let decimals = usize::from(units.decimals);
    let mut base: Balance = 0;
    for digit in whole.bytes() {
        base = base
            .checked_mul(10)
            .and_then(|v| v.checked_add(Balance::from(digit - b'0')))
            .ok_or(AmountError::Overflow)?;
    }
    base = base.checked_mul(units.one()).ok_or(AmountError::Overflow)?;

    // Digits past the token precision are dropped (floor).
    let kept = &fraction[..fraction.len().min(decimals)];
    let mut fractional: Balance = 0;
    for digit in kept.bytes() {
        fractional = fractional * 10 + Balance::from(digit - b'0');
    }
    fractional *= 10u128.pow((decimals - kept.len()) as u32);

    base.checked_add(fractional).ok_or(AmountError::Overflow)
}

/// Exact decimal rendering with trailing zeros trimmed ("12.5", "1", "0").
pub fn format_amount(base: Balance, units: &TokenUnits) -> String {
    format_amount_truncated(base, units, units.decimals)
}

/// Decimal rendering keeping at most `max_fraction_digits`, truncating the rest.
pub fn format_amount_truncated(base: Balance, units: &TokenUnits, max_fraction_digits: u8) -> String {
    let one = units.one();
    let whole = base / one;
    let fraction = base % one;
    if units.decimals == 0 {
        return whole.to_string();
    }

    let padded = format!("{:0width$}", fraction, width = usize::from(units.decimals));
    let kept = &padded[..usize::from(max_fraction_digits.min(units.decimals))];
    let trimmed = kept.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}
