//! JSON-RPC quantity parsing and unit formatting.
//!
//! Quantities are `0x`-prefixed hex strings without leading zeros. Balances are kept as
//! `u128` wei, which covers every realistic native balance.

use thiserror::Error;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
const WEI_PER_GWEI: u128 = 1_000_000_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("invalid hex quantity: {0}")]
    InvalidHex(String),
}

fn strip(value: &str) -> Result<&str, QuantityError> {
    let hex = value
        .strip_prefix("0x")
        .ok_or_else(|| QuantityError::MissingPrefix(value.to_string()))?;
    // "0x" alone is returned by some nodes for zero
    Ok(if hex.is_empty() { "0" } else { hex })
}

/// Parses a hex quantity such as a block number.
///
/// # Errors
/// Returns [`QuantityError`] if the prefix is missing or the digits are not valid hex.
pub fn parse_quantity_u64(value: &str) -> Result<u64, QuantityError> {
    let hex = strip(value)?;
    u64::from_str_radix(hex, 16).map_err(|_| QuantityError::InvalidHex(value.to_string()))
}

/// Parses a hex quantity such as a balance or gas price in wei.
///
/// # Errors
/// Returns [`QuantityError`] if the prefix is missing or the digits are not valid hex.
pub fn parse_quantity_u128(value: &str) -> Result<u128, QuantityError> {
    let hex = strip(value)?;
    u128::from_str_radix(hex, 16).map_err(|_| QuantityError::InvalidHex(value.to_string()))
}

/// Formats wei as ether with up to `decimals` fractional digits, trailing zeros trimmed.
#[must_use]
pub fn format_ether(wei: u128, decimals: usize) -> String {
    format_units(wei, WEI_PER_ETHER, 18, decimals)
}

/// Formats wei as gwei with up to `decimals` fractional digits, trailing zeros trimmed.
#[must_use]
pub fn format_gwei(wei: u128, decimals: usize) -> String {
    format_units(wei, WEI_PER_GWEI, 9, decimals)
}

/// Converts wei to a floating point ether amount for fiat conversion.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn wei_to_ether_f64(wei: u128) -> f64 {
    let whole = (wei / WEI_PER_ETHER) as f64;
    let frac = (wei % WEI_PER_ETHER) as f64 / WEI_PER_ETHER as f64;
    whole + frac
}

fn format_units(value: u128, unit: u128, unit_digits: usize, decimals: usize) -> String {
    let whole = value / unit;
    let frac = value % unit;
    let decimals = decimals.min(unit_digits);
    if decimals == 0 {
        return whole.to_string();
    }

    let mut frac_str = format!("{frac:0unit_digits$}");
    frac_str.truncate(decimals);
    let trimmed = frac_str.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{trimmed}")
    }
}
