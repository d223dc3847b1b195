//! Unit Conversion
//!
//! Rescales raw on-chain integers by a token's decimal exponent into exact
//! decimals, and back. Pricing math goes through `safe_div`/`safe_mul` and
//! accumulators saturate, so a zero denominator or an out-of-range result
//! degrades to a value instead of a panic.
//!
//! Created: 2026-10-12
//! Modified: 2026-10-18 - Amounts wider than 96 bits are rounded, not rejected

use crate::error::{IndexerError, Result};
use alloy::primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Decimal exponent of the pair's liquidity token
pub const LP_TOKEN_DECIMALS: u8 = 18;

/// Largest scale a `Decimal` can carry
const MAX_SCALE: u8 = 28;

/// Mantissa width of a `Decimal`
const MANTISSA_BITS: usize = 96;

const TEN: U256 = U256::from_limbs([10, 0, 0, 0]);

/// 10^decimals as a decimal
pub fn exponent_to_decimal(decimals: u8) -> Result<Decimal> {
    if decimals > MAX_SCALE {
        return Err(IndexerError::UnsupportedDecimals(decimals));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals as u32), 0))
}

/// Raw token amount → decimal quantity.
///
/// Exact while the raw amount fits the 96-bit mantissa. Wider amounts lose
/// their lowest decimal digits (rounded half-up) until they fit, so precision
/// stays at ~28 significant digits. Fails only when the integer part itself
/// is beyond the decimal range.
pub fn convert_token_to_decimal(amount: U256, decimals: u8) -> Result<Decimal> {
    if decimals > MAX_SCALE {
        return Err(IndexerError::UnsupportedDecimals(decimals));
    }

    let mut mantissa = amount;
    let mut scale = decimals as u32;
    let mut dropped = 0u32;
    while mantissa.bit_len() > MANTISSA_BITS {
        if dropped == scale {
            return Err(IndexerError::AmountOutOfRange { amount, decimals });
        }
        dropped += 1;
        let divisor = TEN.pow(U256::from(dropped));
        mantissa = amount / divisor;
        if (amount % divisor) * U256::from(2u8) >= divisor {
            mantissa += U256::from(1u8);
        }
    }
    scale -= dropped;

    let mantissa = mantissa.to::<u128>() as i128;
    Decimal::try_from_i128_with_scale(mantissa, scale)
        .map_err(|_| IndexerError::AmountOutOfRange { amount, decimals })
}

/// Decimal quantity → raw token amount, truncating sub-unit precision.
/// Returns None for negative or unrepresentable values.
pub fn convert_decimal_to_token(value: Decimal, decimals: u8) -> Option<U256> {
    if value.is_sign_negative() {
        return None;
    }
    let factor = exponent_to_decimal(decimals).ok()?;
    let raw = value.checked_mul(factor)?.trunc();
    raw.to_u128().map(U256::from)
}

/// Division defined as zero when the denominator is zero or the quotient
/// is out of range
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Product defined as zero when it is out of range
pub fn safe_mul(lhs: Decimal, rhs: Decimal) -> Decimal {
    lhs.checked_mul(rhs).unwrap_or(Decimal::ZERO)
}
