use log::info;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    config::{require_api_key, PricingSettings, RuntimeConfigSource},
    pricing::PricingError,
    registry::{TokenRegistryRecord, TokenRegistryRepository},
    thegraph::{PoolQuery, PoolStateProvider},
    utils::{normalize_address, normalize_label, normalize_optional},
};

/// Request to register a token's pricing pool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterFromPool {
    /// Blank uses the configured default chain
    #[serde(default)]
    pub chain: String,
    /// Blank uses the configured default dex
    #[serde(default)]
    pub dex: String,
    pub token_address: String,
    pub pool_address: String,
    /// Index-source override for this pool
    #[serde(default)]
    pub subgraph_id: Option<String>,
    /// Explicit stability; `None` infers it from the quote symbol
    #[serde(default)]
    pub quote_token_is_usd_stable: Option<bool>,
}

/// Write path and admin read surface of the token registry.
///
/// Registration classifies the pool sides against the live pool: the
/// registered token is one side, its quote is the other.
pub struct TokenRegistrar {
    registry: Arc<dyn TokenRegistryRepository>,
    pools: Arc<dyn PoolStateProvider>,
    runtime: Arc<dyn RuntimeConfigSource>,
    settings: PricingSettings,
}

impl TokenRegistrar {
    pub fn new(
        registry: Arc<dyn TokenRegistryRepository>,
        pools: Arc<dyn PoolStateProvider>,
        runtime: Arc<dyn RuntimeConfigSource>,
        settings: PricingSettings,
    ) -> Self {
        Self {
            registry,
            pools,
            runtime,
            settings,
        }
    }

    /// Register (or re-register) a token against a pool.
    ///
    /// Returns the record as stored, re-read after the write.
    pub async fn register_from_pool(
        &self,
        request: RegisterFromPool,
    ) -> Result<TokenRegistryRecord, PricingError> {
        let chain = normalize_label(&request.chain, &self.settings.default_chain);
        let dex = normalize_dex(&request.dex, &self.settings.default_dex);
        let token_address = normalize_address(&request.token_address, "token_address")?;
        let pool_address = normalize_address(&request.pool_address, "pool_address")?;
        let subgraph_id = normalize_optional(request.subgraph_id.as_deref());

        let api_key = require_api_key(self.runtime.as_ref()).await?;
        let pool = self
            .pools
            .get_pool(PoolQuery {
                pool_address: &pool_address,
                subgraph_id: subgraph_id.as_deref(),
                api_key: &api_key,
            })
            .await?;

        if !pool.has_both_sides() {
            return Err(PricingError::PoolTokenSidesMissing {
                pool_address,
            });
        }

        let token_side = pool
            .side_of(&token_address)
            .ok_or_else(|| PricingError::TokenNotInPool {
                token_address: token_address.clone(),
                pool_address: pool_address.clone(),
            })?;

        // Zero is a valid decimal count on its own; only absence is rejected
        if pool.token0.decimals.is_none() || pool.token1.decimals.is_none() {
            return Err(PricingError::PoolTokenDecimalsMissing {
                pool_address,
            });
        }

        let quote = pool.token(token_side.other());
        let quote_token_is_usd_stable = request.quote_token_is_usd_stable.unwrap_or_else(|| {
            quote
                .symbol
                .as_deref()
                .is_some_and(|s| self.settings.is_usd_stable_symbol(s))
        });

        let draft = TokenRegistryRecord {
            chain,
            token_address,
            dex,
            pool_address,
            subgraph_id,
            token0_address: pool.token0.address.clone(),
            token1_address: pool.token1.address.clone(),
            token0_symbol: pool.token0.symbol.clone(),
            token1_symbol: pool.token1.symbol.clone(),
            token0_decimals: pool.token0.decimals,
            token1_decimals: pool.token1.decimals,
            quote_token_address: quote.address.clone(),
            quote_token_symbol: quote.symbol.clone(),
            quote_token_is_usd_stable,
            updated_at: None,
        };

        self.registry.upsert(&draft).await?;
        info!(
            "[REGISTRY] Registered {} via pool {} (quote {} stable={}, side={:?})",
            draft.key(),
            draft.pool_address,
            draft.quote_token_address,
            draft.quote_token_is_usd_stable,
            token_side
        );

        let stored = self
            .registry
            .get_by_token_address(&draft.chain, &draft.token_address)
            .await?;
        Ok(stored.unwrap_or(draft))
    }

    /// Look up a single registration.
    pub async fn get_registered(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Option<TokenRegistryRecord>, PricingError> {
        let chain = normalize_label(chain, &self.settings.default_chain);
        let token_address = normalize_address(token_address, "token_address")?;
        self.registry.get_by_token_address(&chain, &token_address).await
    }

    /// List registrations, optionally for one chain.
    pub async fn list_registered(
        &self,
        chain: Option<&str>,
    ) -> Result<Vec<TokenRegistryRecord>, PricingError> {
        let chain = normalize_optional(chain).map(|c| c.to_lowercase());
        self.registry.list_all(chain.as_deref()).await
    }
}

/// Lower-case dex label with known aliases folded.
fn normalize_dex(raw: &str, default: &str) -> String {
    let dex = normalize_label(raw, default);
    match dex.as_str() {
        "pancake_v3" => "pancakeswap_v3".to_string(),
        _ => dex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::pricing::testing::{addr, pool_state, record, FakePoolProvider, SQRT_PRICE_ONE};
    use crate::registry::InMemoryTokenRegistry;

    fn pool_address() -> String {
        addr(0xf0)
    }

    fn registrar(pools: FakePoolProvider) -> (TokenRegistrar, Arc<InMemoryTokenRegistry>) {
        let registry = Arc::new(InMemoryTokenRegistry::new());
        let registrar = TokenRegistrar::new(
            registry.clone(),
            Arc::new(pools),
            Arc::new(RuntimeConfig::with_api_key("test-key")),
            PricingSettings::default(),
        );
        (registrar, registry)
    }

    fn weth_usdc_pools() -> FakePoolProvider {
        FakePoolProvider::new().with_pool(
            &pool_address(),
            pool_state(addr(0xaa), 18, "WETH", addr(0xbb), 6, "USDC", Some(SQRT_PRICE_ONE)),
        )
    }

    fn request(token: &str) -> RegisterFromPool {
        RegisterFromPool {
            chain: "Base".to_string(),
            dex: " Pancake_V3 ".to_string(),
            token_address: token.to_string(),
            pool_address: pool_address(),
            ..RegisterFromPool::default()
        }
    }

    #[tokio::test]
    async fn test_register_token0_against_stable_quote() {
        let (registrar, registry) = registrar(weth_usdc_pools());

        let stored = registrar.register_from_pool(request(&addr(0xaa))).await.unwrap();
        assert_eq!(stored.chain, "base");
        assert_eq!(stored.dex, "pancakeswap_v3");
        assert_eq!(stored.token0_address, addr(0xaa));
        assert_eq!(stored.token1_address, addr(0xbb));
        assert_eq!(stored.token0_decimals, Some(18));
        assert_eq!(stored.token1_decimals, Some(6));
        assert_eq!(stored.quote_token_address, addr(0xbb));
        assert_eq!(stored.quote_token_symbol.as_deref(), Some("USDC"));
        assert!(stored.quote_token_is_usd_stable);
        assert!(stored.has_consistent_quote());
        // Returned from the store, not the draft
        assert!(stored.updated_at.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_token1_quotes_token0() {
        let (registrar, _) = registrar(weth_usdc_pools());

        let stored = registrar.register_from_pool(request(&addr(0xbb))).await.unwrap();
        assert_eq!(stored.quote_token_address, addr(0xaa));
        assert_eq!(stored.quote_token_symbol.as_deref(), Some("WETH"));
        assert!(!stored.quote_token_is_usd_stable);
    }

    #[tokio::test]
    async fn test_stability_override_wins() {
        let (registrar, _) = registrar(weth_usdc_pools());

        let stored = registrar
            .register_from_pool(RegisterFromPool {
                quote_token_is_usd_stable: Some(false),
                subgraph_id: Some("  ".to_string()),
                ..request(&addr(0xaa))
            })
            .await
            .unwrap();
        assert!(!stored.quote_token_is_usd_stable);
        assert_eq!(stored.subgraph_id, None);
    }

    #[tokio::test]
    async fn test_token_not_in_pool() {
        let (registrar, registry) = registrar(weth_usdc_pools());

        let err = registrar.register_from_pool(request(&addr(0xcc))).await.unwrap_err();
        assert_eq!(err.code(), "token_not_in_pool");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_pool_decimals_required() {
        let mut pool = pool_state(addr(0xaa), 18, "WETH", addr(0xbb), 6, "USDC", None);
        pool.token1.decimals = None;
        let (registrar, registry) =
            registrar(FakePoolProvider::new().with_pool(&pool_address(), pool));

        let err = registrar.register_from_pool(request(&addr(0xaa))).await.unwrap_err();
        assert_eq!(err.code(), "pool_token_decimals_missing");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_pool_sides_required() {
        let (registrar, _) = registrar(FakePoolProvider::new());
        let err = registrar.register_from_pool(request(&addr(0xaa))).await.unwrap_err();
        assert_eq!(err.code(), "pool_token_sides_missing");
    }

    #[tokio::test]
    async fn test_invalid_addresses_rejected() {
        let (registrar, _) = registrar(weth_usdc_pools());
        let err = registrar
            .register_from_pool(RegisterFromPool {
                pool_address: "pool".to_string(),
                ..request(&addr(0xaa))
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_evm_address");
        assert!(err.to_string().contains("pool_address"));
    }

    #[tokio::test]
    async fn test_reregistration_replaces_metadata() {
        let (registrar, registry) = registrar(weth_usdc_pools());
        let mut stale = record("base", &addr(0xaa), &addr(0xdd), false);
        stale.pool_address = addr(0x01);
        registry.upsert(&stale).await.unwrap();

        let stored = registrar.register_from_pool(request(&addr(0xaa))).await.unwrap();
        assert_eq!(stored.pool_address, pool_address());
        assert_eq!(stored.quote_token_address, addr(0xbb));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_read_surface_normalizes() {
        let (registrar, _) = registrar(weth_usdc_pools());
        registrar.register_from_pool(request(&addr(0xaa))).await.unwrap();

        let upper = addr(0xaa).to_uppercase().replacen("0X", "0x", 1);
        let found = registrar.get_registered("", &upper).await.unwrap();
        assert!(found.is_some());

        assert_eq!(registrar.list_registered(Some(" BASE ")).await.unwrap().len(), 1);
        assert_eq!(registrar.list_registered(None).await.unwrap().len(), 1);
        assert!(registrar.list_registered(Some("arbitrum")).await.unwrap().is_empty());
    }

    #[test]
    fn test_dex_aliases() {
        assert_eq!(normalize_dex("PANCAKE_V3", "x"), "pancakeswap_v3");
        assert_eq!(normalize_dex("", "pancakeswap_v3"), "pancakeswap_v3");
        assert_eq!(normalize_dex("uniswap_v3", "x"), "uniswap_v3");
    }
}
