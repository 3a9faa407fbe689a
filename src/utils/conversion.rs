//! Parsing and formatting utilities.
//!
//! Upstream indexers return every numeric field as a string (or, for some
//! subgraphs, a JSON number). These helpers parse them into exact big-number
//! types without passing through `f64`.

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint};
use once_cell::sync::Lazy;
use std::str::FromStr;

// ============================================
// Parsing
// ============================================

/// Parse an unsigned base-10 integer of arbitrary size.
///
/// Surrounding whitespace is ignored. Signs, decimal points and exponents are
/// rejected; a sqrtPriceX96 is always an exact integer.
pub fn parse_biguint(raw: &str) -> Option<BigUint> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::from_str(trimmed).ok()
}

/// Parse a decimal string (e.g. `"1834.2219"` or `"1e-7"`) with full precision.
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// Parse a token decimal count. ERC-20 decimals are a `uint8`.
pub fn parse_u8(raw: &str) -> Option<u8> {
    raw.trim().parse::<u8>().ok()
}

// ============================================
// Formatting
// ============================================

/// Render a decimal as a plain string without exponent notation and
/// without trailing fractional zeros.
pub fn decimal_to_plain_string(value: &BigDecimal) -> String {
    value.normalized().to_plain_string()
}

// ============================================
// Internal Helpers
// ============================================

static POW10_CACHE: Lazy<[BigInt; 40]> =
    Lazy::new(|| std::array::from_fn(|i| BigInt::from(10u32).pow(i as u32)));

/// Compute 10^exp as BigInt.
pub fn big_pow10(exp: u32) -> BigInt {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigInt::from(10u32).pow(exp)
    }
}
