//! Price conversion utilities for V3-style pools.
//!
//! Converts sqrtPriceX96 values to exact token1/token0 ratios.

use num_bigint::{BigInt, BigUint};
use num_traits::One;
use once_cell::sync::Lazy;

use super::ratio::Ratio;

// ============================================
// Constants
// ============================================

/// 2^192, the square of the Q64.96 scaling factor.
pub static Q192: Lazy<BigInt> = Lazy::new(|| BigInt::one() << 192u32);

/// sqrtPriceX96 is stored on-chain as a `uint160`.
pub const MAX_SQRT_PRICE_BITS: u64 = 160;

// ============================================
// sqrtPriceX96 to Price Conversion
// ============================================

/// Convert sqrtPriceX96 to the decimal-adjusted token1-per-token0 price.
///
/// ```text
/// price = sqrtPriceX96^2 / 2^192 * 10^(decimals0 - decimals1)
/// ```
///
/// The result is exact; no rounding is applied.
///
/// # Arguments
/// * `sqrt_price_x96` - The pool's current sqrtPriceX96
/// * `token0_decimals` - Decimal places of token0
/// * `token1_decimals` - Decimal places of token1
pub fn sqrt_price_x96_to_ratio(
    sqrt_price_x96: &BigUint,
    token0_decimals: u8,
    token1_decimals: u8,
) -> Ratio {
    let sqrt_price = BigInt::from(sqrt_price_x96.clone());
    let squared = &sqrt_price * &sqrt_price;

    let raw = Ratio::from_parts(squared, Q192.clone());

    let decimal_diff = token0_decimals as i32 - token1_decimals as i32;
    raw * Ratio::pow10(decimal_diff)
}
