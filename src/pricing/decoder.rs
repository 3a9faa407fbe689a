//! Pool price decoding.
//!
//! Turns a live [`PoolState`] into the price of one pool side denominated in
//! the other, as an exact [`Ratio`].
//!
//! Two upstream shapes are supported:
//! - `sqrtPrice` (sqrtPriceX96) plus both sides' decimals: deterministic, preferred
//! - `token0Price` / `token1Price` decimal strings: used only when `sqrtPrice`
//!   is absent. Their orientation differs between subgraph deployments, so
//!   this path is best-effort.

use crate::pricing::PricingError;
use crate::thegraph::{PoolSide, PoolState};
use crate::utils::{parse_biguint, parse_decimal, sqrt_price_x96_to_ratio, Ratio, MAX_SQRT_PRICE_BITS};

/// Which way the price is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    /// token1 per one token0
    Token0InToken1,
    /// token0 per one token1
    Token1InToken0,
}

impl PriceDirection {
    /// Direction for pricing `token_address` in `quote_token_address`,
    /// checked against the live pool sides.
    pub fn for_pair(
        pool: &PoolState,
        pool_address: &str,
        token_address: &str,
        quote_token_address: &str,
    ) -> Result<Self, PricingError> {
        match (pool.side_of(token_address), pool.side_of(quote_token_address)) {
            (Some(PoolSide::Token0), Some(PoolSide::Token1)) => Ok(Self::Token0InToken1),
            (Some(PoolSide::Token1), Some(PoolSide::Token0)) => Ok(Self::Token1InToken0),
            // Registry record is stale relative to the live pool
            _ => Err(PricingError::TokenNotInPool {
                token_address: token_address.to_string(),
                pool_address: pool_address.to_string(),
            }),
        }
    }
}

/// Price of `token_address` in units of `quote_token_address`.
pub fn decode_price_in_quote(
    pool: &PoolState,
    pool_address: &str,
    token_address: &str,
    quote_token_address: &str,
) -> Result<Ratio, PricingError> {
    let direction = PriceDirection::for_pair(pool, pool_address, token_address, quote_token_address)?;

    match pool.sqrt_price.as_deref() {
        Some(raw) => decode_sqrt_price(pool, pool_address, raw, direction),
        None => decode_price_strings(pool, pool_address, direction),
    }
}

fn decode_sqrt_price(
    pool: &PoolState,
    pool_address: &str,
    raw: &str,
    direction: PriceDirection,
) -> Result<Ratio, PricingError> {
    let (decimals0, decimals1) = pool
        .decimals()
        .ok_or_else(|| PricingError::PoolTokenDecimalsMissing {
            pool_address: pool_address.to_string(),
        })?;

    let sqrt_price_x96 = parse_biguint(raw)
        .filter(|v| v.bits() <= MAX_SQRT_PRICE_BITS)
        .ok_or_else(|| PricingError::InvalidNumericField {
            field: "sqrtPrice",
            value: raw.to_string(),
        })?;

    let token1_per_token0 = sqrt_price_x96_to_ratio(&sqrt_price_x96, decimals0, decimals1);

    match direction {
        PriceDirection::Token0InToken1 => Ok(token1_per_token0),
        PriceDirection::Token1InToken0 => {
            token1_per_token0
                .recip()
                .ok_or_else(|| PricingError::InvalidSqrtPriceRatio {
                    pool_address: pool_address.to_string(),
                })
        },
    }
}

fn decode_price_strings(
    pool: &PoolState,
    pool_address: &str,
    direction: PriceDirection,
) -> Result<Ratio, PricingError> {
    // For token0 priced in token1 the field read first is token0Price, and
    // token1Price is inverted only when token0Price is absent. Mirrored for token1.
    let (direct, direct_field, inverse, inverse_field) = match direction {
        PriceDirection::Token0InToken1 => (
            pool.token0_price.as_deref(),
            "token0Price",
            pool.token1_price.as_deref(),
            "token1Price",
        ),
        PriceDirection::Token1InToken0 => (
            pool.token1_price.as_deref(),
            "token1Price",
            pool.token0_price.as_deref(),
            "token0Price",
        ),
    };

    match (direct, inverse) {
        (Some(raw), _) => parse_price(raw, direct_field),
        (None, Some(raw)) => parse_price(raw, inverse_field)?.recip().ok_or_else(|| {
            PricingError::FailedToComputePriceInQuote {
                pool_address: pool_address.to_string(),
            }
        }),
        (None, None) => Err(PricingError::PoolPricesMissing {
            pool_address: pool_address.to_string(),
        }),
    }
}

/// Exponents beyond `MAX_DECIMAL_SCALE` are rejected rather than truncated.
fn parse_price(raw: &str, field: &'static str) -> Result<Ratio, PricingError> {
    parse_decimal(raw)
        .and_then(|d| Ratio::from_decimal(&d))
        .ok_or_else(|| PricingError::InvalidNumericField {
            field,
            value: raw.to_string(),
        })
}
