//! Exact conversion between human readable decimal strings and on-chain base
//! units. Amounts never pass through floating point.

use alloy::primitives::{
    utils::{format_units, parse_units},
    U256,
};

use crate::error::{Result, SwapError};

/// Parses `"0.1"` with `decimals = 18` into `100000000000000000`.
///
/// Rejects signs, exponents, separators and fractional digits beyond
/// `decimals`; those would otherwise be truncated silently.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (amount, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || frac.is_some_and(|f| !all_digits(f)) {
        return Err(SwapError::invalid(format!("malformed amount {:?}", amount)));
    }
    if let Some(frac) = frac {
        if frac.len() > decimals as usize {
            return Err(SwapError::invalid(format!(
                "amount {} has {} fractional digits, token supports {}",
                amount,
                frac.len(),
                decimals
            )));
        }
    }

    parse_units(amount, decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| SwapError::invalid(format!("amount {}: {}", amount, e)))
}

/// Formats base units with `decimals`, dropping trailing fractional zeros.
pub fn format_amount(value: U256, decimals: u8) -> Result<String> {
    let formatted = format_units(value, decimals)
        .map_err(|e| SwapError::invalid(format!("format {}: {}", value, e)))?;
    Ok(trim_fraction(&formatted))
}

fn trim_fraction(formatted: &str) -> String {
    if !formatted.contains('.') {
        return formatted.to_string();
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
