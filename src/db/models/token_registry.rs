use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thegraph::PoolSide;

/// Pricing source registered for a token (PostgreSQL)
///
/// Primary Key: (chain, token_address)
/// Query Pattern: "Which pool prices token X on chain Y, and in what quote?"
///
/// Pool metadata (sides, symbols, decimals) is cached at registration time.
/// The quote token is always the pool side opposite `token_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistryRecord {
    // Primary key
    pub chain: String,
    pub token_address: String,

    pub dex: String,
    pub pool_address: String,
    /// Index-source override; `None` uses the default subgraph
    pub subgraph_id: Option<String>,

    // Cached pool metadata
    pub token0_address: String,
    pub token1_address: String,
    pub token0_symbol: Option<String>,
    pub token1_symbol: Option<String>,
    pub token0_decimals: Option<u8>,
    pub token1_decimals: Option<u8>,

    // Quote side for USD conversion
    pub quote_token_address: String,
    pub quote_token_symbol: Option<String>,
    pub quote_token_is_usd_stable: bool,

    /// Set by the store on every upsert
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TokenRegistryRecord {
    /// Identity within a resolution call tree: `chain:token_address`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.chain, self.token_address)
    }

    /// Side of the registered token among the cached pool sides.
    pub fn token_side(&self) -> Option<PoolSide> {
        if self.token_address == self.token0_address {
            Some(PoolSide::Token0)
        } else if self.token_address == self.token1_address {
            Some(PoolSide::Token1)
        } else {
            None
        }
    }

    /// Decimals captured at registration for a pool side.
    pub fn decimals_for(&self, side: PoolSide) -> Option<u8> {
        match side {
            PoolSide::Token0 => self.token0_decimals,
            PoolSide::Token1 => self.token1_decimals,
        }
    }

    /// `quote_token_address` is the side that is not `token_address`.
    pub fn has_consistent_quote(&self) -> bool {
        match self.token_side() {
            Some(PoolSide::Token0) => self.quote_token_address == self.token1_address,
            Some(PoolSide::Token1) => self.quote_token_address == self.token0_address,
            None => false,
        }
    }
}
