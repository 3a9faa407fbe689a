//! Utility functions for the pricing engine.
//!
//! This module is organized into focused submodules:
//!
//! - [`address`] - EVM address and label normalization
//! - [`conversion`] - Parsing and formatting of big integers and decimals
//! - [`ratio`] - Exact rational arithmetic used for all price math
//! - [`price`] - sqrtPriceX96 decoding into exact ratios

mod address;
mod conversion;
mod price;
mod ratio;

// ============================================
// Re-exports
// ============================================

// Address utilities
pub use address::{is_evm_address, normalize_address, normalize_label, normalize_optional};

// Conversion utilities
pub use conversion::{big_pow10, decimal_to_plain_string, parse_biguint, parse_decimal, parse_u8};

// Price conversion utilities
pub use price::{sqrt_price_x96_to_ratio, MAX_SQRT_PRICE_BITS, Q192};

// Exact arithmetic
pub use ratio::{Ratio, MAX_DECIMAL_SCALE, WORKING_PRECISION};
