use log::debug;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::{require_api_key, PricingSettings, RuntimeConfigSource},
    pricing::{decode_price_in_quote, PricingError, TokenPriceResult},
    registry::{TokenRegistryRecord, TokenRegistryRepository},
    thegraph::{PoolQuery, PoolStateProvider},
    utils::{normalize_address, normalize_label, Ratio},
};

/// Maximum number of quote-to-quote hops below the requested token.
pub const MAX_QUOTE_DEPTH: u8 = 3;

/// A token priced in its direct quote token.
struct Hop {
    price_in_quote: Ratio,
    decimals: u8,
}

/// USD price resolution for registered tokens.
///
/// Resolution is on-demand and uncached:
/// 1. Load the token's registry record
/// 2. Fetch its pool from the indexer and price it in its quote token
/// 3. Quote is USD-stable → done
/// 4. Otherwise repeat for the quote token's own record
///
/// Hops run sequentially since each depends on the previous quote address.
/// The walk is bounded by [`MAX_QUOTE_DEPTH`] and by a visited set scoped to
/// a single call, so a miswired registry fails fast instead of looping.
///
/// Prices are composed as exact ratios and rounded once at the end.
pub struct PriceResolver {
    registry: Arc<dyn TokenRegistryRepository>,
    pools: Arc<dyn PoolStateProvider>,
    runtime: Arc<dyn RuntimeConfigSource>,
    default_chain: String,
}

impl PriceResolver {
    pub fn new(
        registry: Arc<dyn TokenRegistryRepository>,
        pools: Arc<dyn PoolStateProvider>,
        runtime: Arc<dyn RuntimeConfigSource>,
        settings: &PricingSettings,
    ) -> Self {
        Self {
            registry,
            pools,
            runtime,
            default_chain: settings.default_chain.clone(),
        }
    }

    /// Get the USD price of a registered token.
    pub async fn resolve_usd(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<TokenPriceResult, PricingError> {
        let chain = normalize_label(chain, &self.default_chain);
        let token_address = normalize_address(token_address, "token_address")?;

        let root = self
            .registry
            .get_by_token_address(&chain, &token_address)
            .await?
            .ok_or_else(|| PricingError::TokenNotRegistered {
                chain: chain.clone(),
                token_address: token_address.clone(),
            })?;

        // Read once per call and passed down to every hop
        let api_key = require_api_key(self.runtime.as_ref()).await?;

        let mut visited: FxHashSet<String> = FxHashSet::default();
        let root_hop = self.visit(&chain, &root, &api_key, &mut visited, 0).await?;

        let mut price_usd = root_hop.price_in_quote.clone();
        let mut stable = root.quote_token_is_usd_stable;
        let mut quote_address = root.quote_token_address.clone();
        let mut depth: u8 = 0;

        while !stable {
            depth += 1;
            let record = self
                .registry
                .get_by_token_address(&chain, &quote_address)
                .await?
                .ok_or_else(|| PricingError::QuoteTokenNotRegistered {
                    chain: chain.clone(),
                    token_address: quote_address.clone(),
                })?;

            let hop = self.visit(&chain, &record, &api_key, &mut visited, depth).await?;
            price_usd = &price_usd * &hop.price_in_quote;
            stable = record.quote_token_is_usd_stable;
            quote_address = record.quote_token_address;
        }

        Ok(TokenPriceResult {
            chain,
            token_address: root.token_address,
            price_usd: price_usd.to_decimal(),
            quote_token_address: root.quote_token_address,
            quote_token_is_usd_stable: root.quote_token_is_usd_stable,
            price_in_quote: root_hop.price_in_quote.to_decimal(),
            pool_address: root.pool_address,
            decimals: root_hop.decimals,
        })
    }

    /// [`resolve_usd`](Self::resolve_usd), aborted as soon as `cancel` fires.
    ///
    /// The pending indexer request is dropped; resolution never writes state.
    pub async fn resolve_usd_cancellable(
        &self,
        chain: &str,
        token_address: &str,
        cancel: &CancellationToken,
    ) -> Result<TokenPriceResult, PricingError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PricingError::Cancelled),
            result = self.resolve_usd(chain, token_address) => result,
        }
    }

    /// Guard one hop against depth and cycles, then price it.
    async fn visit(
        &self,
        chain: &str,
        record: &TokenRegistryRecord,
        api_key: &str,
        visited: &mut FxHashSet<String>,
        depth: u8,
    ) -> Result<Hop, PricingError> {
        if depth > MAX_QUOTE_DEPTH {
            return Err(PricingError::QuoteResolutionDepthExceeded {
                max_depth: MAX_QUOTE_DEPTH,
            });
        }

        let key = format!("{}:{}", chain, record.token_address);
        if !visited.insert(key.clone()) {
            return Err(PricingError::QuoteResolutionCycle {
                key,
            });
        }

        let hop = self.price_in_quote(record, api_key).await?;
        debug!(
            "[PRICING] {} depth={} pool={} price_in_quote={}",
            key,
            depth,
            record.pool_address,
            hop.price_in_quote.to_decimal()
        );
        Ok(hop)
    }

    /// Fetch the record's pool and price its token in its quote token.
    async fn price_in_quote(
        &self,
        record: &TokenRegistryRecord,
        api_key: &str,
    ) -> Result<Hop, PricingError> {
        let pool = self
            .pools
            .get_pool(PoolQuery {
                pool_address: &record.pool_address,
                subgraph_id: record.subgraph_id.as_deref(),
                api_key,
            })
            .await?;

        if !pool.has_both_sides() {
            return Err(PricingError::PoolTokenSidesMissing {
                pool_address: record.pool_address.clone(),
            });
        }

        // Checked before any ratio math, whichever price shape the pool has
        if pool.decimals().is_none() {
            return Err(PricingError::PoolTokenDecimalsMissing {
                pool_address: record.pool_address.clone(),
            });
        }

        if pool.side_of(&record.token_address).is_none() {
            return Err(PricingError::TokenNotInPool {
                token_address: record.token_address.clone(),
                pool_address: record.pool_address.clone(),
            });
        }

        let decimals = record
            .token_side()
            .and_then(|side| record.decimals_for(side))
            .ok_or_else(|| PricingError::RegistryMissingDecimals {
                token_address: record.token_address.clone(),
            })?;

        let price_in_quote = decode_price_in_quote(
            &pool,
            &record.pool_address,
            &record.token_address,
            &record.quote_token_address,
        )?;

        Ok(Hop {
            price_in_quote,
            decimals,
        })
    }
}
