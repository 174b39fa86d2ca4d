//! Conversion of raw token amounts into human-scaled decimals.

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Decimals assumed when a token does not report its own.
pub const DEFAULT_DECIMALS: u8 = 18;

// Largest mantissa and scale a `Decimal` can carry.
const MAX_MANTISSA: u128 = 79_228_162_514_264_337_593_543_950_335;
const MAX_SCALE: u32 = 28;

/// `raw / 10^decimals` in both exact text and `Decimal` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledAmount {
    /// Exact rendering, without trailing fractional zeros.
    pub formatted: String,
    /// Nearest `Decimal`, truncated toward zero when the exact value does not fit.
    pub value: Decimal,
    /// Set when `value` lost digits relative to `formatted`.
    pub truncated: bool,
}

/// Scale `raw` (smallest token unit) down by `10^decimals`.
pub fn scale_amount(raw: U256, decimals: u8) -> ScaledAmount {
    let (value, truncated) = to_decimal(raw, decimals);
    let formatted = match format_units(raw, decimals) {
        Ok(text) => trim_fraction(&text).to_string(),
        Err(_) => value.to_string(),
    };
    ScaledAmount {
        formatted,
        value,
        truncated,
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

// Exact whenever the raw value fits in a 96-bit mantissa. Larger values lose
// their least significant digits until they fit.
fn to_decimal(raw: U256, decimals: u8) -> (Decimal, bool) {
    let mut mantissa = raw;
    let mut scale = u32::from(decimals);
    let mut truncated = false;
    let ten = U256::from(10u8);
    let max_mantissa = U256::from(MAX_MANTISSA);

    while scale > MAX_SCALE || (mantissa > max_mantissa && scale > 0) {
        truncated |= mantissa % ten != U256::ZERO;
        mantissa /= ten;
        scale -= 1;
    }

    if mantissa > max_mantissa {
        // Integral part alone exceeds what a Decimal can hold.
        return (Decimal::MAX, true);
    }

    (
        Decimal::from_i128_with_scale(mantissa.to::<u128>() as i128, scale).normalize(),
        truncated,
    )
}
