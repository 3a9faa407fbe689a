//! Test fixtures shared by pricing, registry and provider tests.

use std::sync::Mutex;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::pricing::PricingError;
use crate::registry::TokenRegistryRecord;
use crate::thegraph::{PoolQuery, PoolState, PoolStateProvider, PoolToken};

/// 2^96: unit raw price
pub const SQRT_PRICE_ONE: &str = "79228162514264337593543950336";
/// 2^97: raw price 4
pub const SQRT_PRICE_FOUR: &str = "158456325028528675187087900672";

/// Deterministic lower-case address ending in `n`.
pub fn addr(n: u8) -> String {
    format!("0x{:040x}", n)
}

pub fn pool_state(
    token0: String,
    decimals0: u8,
    symbol0: &str,
    token1: String,
    decimals1: u8,
    symbol1: &str,
    sqrt_price: Option<&str>,
) -> PoolState {
    PoolState {
        sqrt_price: sqrt_price.map(str::to_string),
        token0: PoolToken {
            address: token0,
            symbol: Some(symbol0.to_string()),
            decimals: Some(decimals0),
        },
        token1: PoolToken {
            address: token1,
            symbol: Some(symbol1.to_string()),
            decimals: Some(decimals1),
        },
        ..PoolState::default()
    }
}

/// Record with `token` as token0 and `quote` as token1, both 18 decimals.
pub fn record(chain: &str, token: &str, quote: &str, quote_is_usd_stable: bool) -> TokenRegistryRecord {
    TokenRegistryRecord {
        chain: chain.to_string(),
        token_address: token.to_string(),
        dex: "pancakeswap_v3".to_string(),
        pool_address: addr(0xff),
        subgraph_id: None,
        token0_address: token.to_string(),
        token1_address: quote.to_string(),
        token0_symbol: None,
        token1_symbol: None,
        token0_decimals: Some(18),
        token1_decimals: Some(18),
        quote_token_address: quote.to_string(),
        quote_token_symbol: None,
        quote_token_is_usd_stable: quote_is_usd_stable,
        updated_at: None,
    }
}

/// In-memory pool provider.
///
/// Unknown pools come back empty, like a `null` subgraph pool. Pools marked
/// as hanging never resolve.
#[derive(Default)]
pub struct FakePoolProvider {
    pools: FxHashMap<String, PoolState>,
    hanging: Vec<String>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakePoolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, pool_address: &str, state: PoolState) -> Self {
        self.pools.insert(pool_address.to_string(), state);
        self
    }

    pub fn with_hanging_pool(mut self, pool_address: &str) -> Self {
        self.hanging.push(pool_address.to_string());
        self
    }

    /// `(pool_address, subgraph_id)` of every fetch, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PoolStateProvider for FakePoolProvider {
    async fn get_pool(&self, query: PoolQuery<'_>) -> Result<PoolState, PricingError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((query.pool_address.to_string(), query.subgraph_id.map(str::to_string)));
        }
        if self.hanging.iter().any(|p| p == query.pool_address) {
            std::future::pending::<()>().await;
        }
        Ok(self.pools.get(query.pool_address).cloned().unwrap_or_default())
    }
}
