//! Pool state as returned by a V3-style subgraph.
//!
//! Subgraphs encode every BigInt/BigDecimal field as a JSON string, and some
//! deployments omit fields entirely. Raw values are kept as strings here and
//! parsed only where they are priced, so a malformed unused field (volume,
//! TVL) never fails a resolution.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::pricing::PricingError;
use crate::utils::parse_u8;

/// Which side of a pool a token sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSide {
    Token0,
    Token1,
}

impl PoolSide {
    pub fn other(self) -> Self {
        match self {
            Self::Token0 => Self::Token1,
            Self::Token1 => Self::Token0,
        }
    }
}

/// One side of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolToken {
    /// Lower-cased address; empty when the indexer did not return one.
    pub address: String,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

/// Current pool state from the indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolState {
    pub id: Option<String>,
    pub fee_tier: Option<String>,
    pub liquidity: Option<String>,
    /// sqrtPriceX96 as a base-10 integer string
    pub sqrt_price: Option<String>,
    pub tick: Option<String>,
    pub token0_price: Option<String>,
    pub token1_price: Option<String>,
    pub volume_usd: Option<String>,
    pub total_value_locked_usd: Option<String>,
    pub token0: PoolToken,
    pub token1: PoolToken,
}

impl PoolState {
    /// Decode the `pool` object of a subgraph response.
    ///
    /// `null` decodes to an empty state, which later fails as
    /// `pool_token_sides_missing`.
    pub fn from_graph_json(value: Value) -> Result<Self, PricingError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        let raw: GraphPool =
            serde_json::from_value(value).map_err(|e| PricingError::UpstreamInvalidResponse {
                message: e.to_string(),
            })?;
        raw.try_into()
    }

    pub fn token(&self, side: PoolSide) -> &PoolToken {
        match side {
            PoolSide::Token0 => &self.token0,
            PoolSide::Token1 => &self.token1,
        }
    }

    pub fn has_both_sides(&self) -> bool {
        !self.token0.address.is_empty() && !self.token1.address.is_empty()
    }

    /// Locate a (lower-cased) token address among the pool sides.
    pub fn side_of(&self, token_address: &str) -> Option<PoolSide> {
        if token_address.is_empty() {
            None
        } else if self.token0.address == token_address {
            Some(PoolSide::Token0)
        } else if self.token1.address == token_address {
            Some(PoolSide::Token1)
        } else {
            None
        }
    }

    /// Both sides' decimals, if present.
    ///
    /// A `(0, 0)` pair is how unpopulated subgraph entities surface and is
    /// treated as missing.
    pub fn decimals(&self) -> Option<(u8, u8)> {
        match (self.token0.decimals, self.token1.decimals) {
            (Some(0), Some(0)) => None,
            (Some(d0), Some(d1)) => Some((d0, d1)),
            _ => None,
        }
    }
}

// ============================================
// Raw subgraph shape
// ============================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphPool {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    fee_tier: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    liquidity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    sqrt_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tick: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    token0_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    token1_price: Option<String>,
    #[serde(default, rename = "volumeUSD", deserialize_with = "lenient_string")]
    volume_usd: Option<String>,
    #[serde(default, rename = "totalValueLockedUSD", deserialize_with = "lenient_string")]
    total_value_locked_usd: Option<String>,
    #[serde(default)]
    token0: Option<GraphToken>,
    #[serde(default)]
    token1: Option<GraphToken>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphToken {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    decimals: Option<String>,
}

impl GraphToken {
    fn into_pool_token(self, field: &'static str) -> Result<PoolToken, PricingError> {
        let decimals = match self.decimals {
            Some(raw) => Some(parse_u8(&raw).ok_or(PricingError::InvalidNumericField {
                field,
                value: raw,
            })?),
            None => None,
        };
        Ok(PoolToken {
            address: self
                .id
                .map(|a| a.trim().to_lowercase())
                .unwrap_or_default(),
            symbol: self.symbol,
            decimals,
        })
    }
}

impl TryFrom<GraphPool> for PoolState {
    type Error = PricingError;

    fn try_from(raw: GraphPool) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id.map(|id| id.to_lowercase()),
            fee_tier: raw.fee_tier,
            liquidity: raw.liquidity,
            sqrt_price: raw.sqrt_price,
            tick: raw.tick,
            token0_price: raw.token0_price,
            token1_price: raw.token1_price,
            volume_usd: raw.volume_usd,
            total_value_locked_usd: raw.total_value_locked_usd,
            token0: raw.token0.unwrap_or_default().into_pool_token("token0.decimals")?,
            token1: raw.token1.unwrap_or_default().into_pool_token("token1.decimals")?,
        })
    }
}

/// Accept a string, number or null; blank strings become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        },
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_subgraph_pool() {
        let pool = PoolState::from_graph_json(json!({
            "id": "0xD0B53D9277642D899DF5C87A3966A349A798F224",
            "feeTier": "500",
            "liquidity": "1234567",
            "sqrtPrice": "4295128739",
            "tick": "-887272",
            "token0Price": "0.5",
            "token1Price": "2",
            "volumeUSD": "100.25",
            "totalValueLockedUSD": "5000",
            "token0": { "id": "0x4200000000000000000000000000000000000006", "symbol": "WETH", "decimals": "18" },
            "token1": { "id": "0x833589FCD6EDB6E08F4C7C32D4F71B54BDA02913", "symbol": "USDC", "decimals": 6 }
        }))
        .unwrap();

        assert_eq!(pool.id.as_deref(), Some("0xd0b53d9277642d899df5c87a3966a349a798f224"));
        assert_eq!(pool.sqrt_price.as_deref(), Some("4295128739"));
        assert_eq!(pool.token1.address, "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
        assert_eq!(pool.decimals(), Some((18, 6)));
        assert_eq!(pool.side_of("0x4200000000000000000000000000000000000006"), Some(PoolSide::Token0));
        assert_eq!(pool.side_of("0x0000000000000000000000000000000000000001"), None);
    }

    #[test]
    fn test_missing_optional_fields_are_absent() {
        let pool = PoolState::from_graph_json(json!({
            "token0": { "id": "0xaa", "symbol": "" },
            "token1": { "id": "0xbb", "decimals": null }
        }))
        .unwrap();
        assert!(pool.sqrt_price.is_none());
        assert!(pool.token0_price.is_none());
        assert!(pool.token0.symbol.is_none());
        assert!(pool.decimals().is_none());
        assert!(pool.has_both_sides());
    }

    #[test]
    fn test_null_pool_is_empty() {
        let pool = PoolState::from_graph_json(Value::Null).unwrap();
        assert!(!pool.has_both_sides());
    }

    #[test]
    fn test_malformed_decimals_rejected() {
        let err = PoolState::from_graph_json(json!({
            "token0": { "id": "0xaa", "decimals": "eighteen" },
            "token1": { "id": "0xbb", "decimals": "6" }
        }))
        .unwrap_err();
        assert_eq!(err.code(), "invalid_numeric_field");
    }

    #[test]
    fn test_zero_decimal_pair_is_missing() {
        let mut pool = PoolState::default();
        pool.token0.decimals = Some(0);
        pool.token1.decimals = Some(0);
        assert!(pool.decimals().is_none());
        pool.token1.decimals = Some(6);
        assert_eq!(pool.decimals(), Some((0, 6)));
    }
}
