use anyhow::Context;
use async_trait::async_trait;
use log::error;

use crate::config::{RuntimeConfig, RuntimeConfigSource};
use crate::db::models::TokenRegistryRecord;
use crate::db::postgres::PostgresClient;
use crate::pricing::PricingError;
use crate::registry::TokenRegistryRepository;

/// Sanitize a string for PostgreSQL by removing null bytes (0x00)
/// which are invalid in UTF-8 text columns
fn sanitize_string(s: &str) -> String {
    s.replace('\0', "")
}

fn sanitize_optional(s: &Option<String>) -> Option<String> {
    s.as_deref().map(sanitize_string)
}

const TOKEN_REGISTRY_COLUMNS: &str = r#"
    chain, token_address, dex, pool_address, subgraph_id,
    token0_address, token1_address, token0_symbol, token1_symbol,
    token0_decimals, token1_decimals,
    quote_token_address, quote_token_symbol, quote_token_is_usd_stable,
    updated_at
"#;

impl PostgresClient {
    // ==================== TOKEN REGISTRY ====================

    /// Insert or replace a token registry record keyed by (chain, token_address)
    pub async fn set_token_registry(&self, record: &TokenRegistryRecord) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO pricing.token_registry (
                chain, token_address, dex, pool_address, subgraph_id,
                token0_address, token1_address, token0_symbol, token1_symbol,
                token0_decimals, token1_decimals,
                quote_token_address, quote_token_symbol, quote_token_is_usd_stable,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW())
            ON CONFLICT (chain, token_address) DO UPDATE SET
                dex = EXCLUDED.dex,
                pool_address = EXCLUDED.pool_address,
                subgraph_id = EXCLUDED.subgraph_id,
                token0_address = EXCLUDED.token0_address,
                token1_address = EXCLUDED.token1_address,
                token0_symbol = EXCLUDED.token0_symbol,
                token1_symbol = EXCLUDED.token1_symbol,
                token0_decimals = EXCLUDED.token0_decimals,
                token1_decimals = EXCLUDED.token1_decimals,
                quote_token_address = EXCLUDED.quote_token_address,
                quote_token_symbol = EXCLUDED.quote_token_symbol,
                quote_token_is_usd_stable = EXCLUDED.quote_token_is_usd_stable,
                updated_at = EXCLUDED.updated_at
        "#;

        let token0_decimals = record.token0_decimals.map(i16::from);
        let token1_decimals = record.token1_decimals.map(i16::from);

        client
            .execute(
                query,
                &[
                    &record.chain,
                    &record.token_address,
                    &sanitize_string(&record.dex),
                    &record.pool_address,
                    &sanitize_optional(&record.subgraph_id),
                    &record.token0_address,
                    &record.token1_address,
                    &sanitize_optional(&record.token0_symbol),
                    &sanitize_optional(&record.token1_symbol),
                    &token0_decimals,
                    &token1_decimals,
                    &record.quote_token_address,
                    &sanitize_optional(&record.quote_token_symbol),
                    &record.quote_token_is_usd_stable,
                ],
            )
            .await
            .map_err(|e| {
                error!("[REGISTRY] Failed to upsert {}: {:?}", record.key(), e);
                e
            })?;

        Ok(())
    }

    /// Get a single token registry record
    pub async fn get_token_registry(
        &self,
        chain: &str,
        token_address: &str,
    ) -> anyhow::Result<Option<TokenRegistryRecord>> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {} FROM pricing.token_registry WHERE chain = $1 AND token_address = $2",
            TOKEN_REGISTRY_COLUMNS
        );

        let chain = chain.trim().to_lowercase();
        let token_address = token_address.trim().to_lowercase();

        let row = client
            .query_opt(query.as_str(), &[&chain, &token_address])
            .await
            .context("Failed to query token registry")?;

        row.as_ref().map(row_to_token_registry).transpose()
    }

    /// List token registry records, optionally for a single chain
    pub async fn list_token_registry(
        &self,
        chain: Option<&str>,
    ) -> anyhow::Result<Vec<TokenRegistryRecord>> {
        let client = self.pool.get().await?;

        let rows = match chain.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty()) {
            Some(chain) => {
                let query = format!(
                    "SELECT {} FROM pricing.token_registry WHERE chain = $1 ORDER BY chain, token_address",
                    TOKEN_REGISTRY_COLUMNS
                );
                client
                    .query(query.as_str(), &[&chain])
                    .await
                    .context("Failed to list token registry")?
            },
            None => {
                let query = format!(
                    "SELECT {} FROM pricing.token_registry ORDER BY chain, token_address",
                    TOKEN_REGISTRY_COLUMNS
                );
                client
                    .query(query.as_str(), &[])
                    .await
                    .context("Failed to list token registry")?
            },
        };

        rows.iter().map(row_to_token_registry).collect()
    }

    // ==================== SYSTEM CONFIG ====================

    /// Get the runtime configuration row, if one has been written
    pub async fn get_system_config(&self) -> anyhow::Result<Option<RuntimeConfig>> {
        let client = self.pool.get().await?;
        let query = r#"
            SELECT thegraph_api_key
            FROM pricing.system_config
            WHERE id = 'runtime'
        "#;

        let row = client
            .query_opt(query, &[])
            .await
            .context("Failed to query system config")?;

        Ok(row.map(|row| RuntimeConfig {
            index_api_key: row.get("thegraph_api_key"),
        }))
    }

    /// Store the runtime configuration row
    pub async fn set_system_config(&self, runtime: &RuntimeConfig) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        let query = r#"
            INSERT INTO pricing.system_config (id, thegraph_api_key, updated_at)
            VALUES ('runtime', $1, NOW())
            ON CONFLICT (id) DO UPDATE SET
                thegraph_api_key = EXCLUDED.thegraph_api_key,
                updated_at = EXCLUDED.updated_at
        "#;

        client
            .execute(query, &[&sanitize_optional(&runtime.index_api_key)])
            .await
            .context("Failed to store system config")?;

        Ok(())
    }
}

fn row_to_token_registry(row: &tokio_postgres::Row) -> anyhow::Result<TokenRegistryRecord> {
    // Lowercase addresses for consistent comparisons
    let chain: String = row.get("chain");
    let token_address: String = row.get("token_address");
    let pool_address: String = row.get("pool_address");
    let token0_address: String = row.get("token0_address");
    let token1_address: String = row.get("token1_address");
    let quote_token_address: String = row.get("quote_token_address");
    let token0_decimals: Option<i16> = row.get("token0_decimals");
    let token1_decimals: Option<i16> = row.get("token1_decimals");

    Ok(TokenRegistryRecord {
        chain: chain.to_lowercase(),
        token_address: token_address.to_lowercase(),
        dex: row.get("dex"),
        pool_address: pool_address.to_lowercase(),
        subgraph_id: row.get("subgraph_id"),
        token0_address: token0_address.to_lowercase(),
        token1_address: token1_address.to_lowercase(),
        token0_symbol: row.get("token0_symbol"),
        token1_symbol: row.get("token1_symbol"),
        token0_decimals: token0_decimals
            .map(u8::try_from)
            .transpose()
            .context("token0_decimals out of range")?,
        token1_decimals: token1_decimals
            .map(u8::try_from)
            .transpose()
            .context("token1_decimals out of range")?,
        quote_token_address: quote_token_address.to_lowercase(),
        quote_token_symbol: row.get("quote_token_symbol"),
        quote_token_is_usd_stable: row.get("quote_token_is_usd_stable"),
        updated_at: row.get("updated_at"),
    })
}

// ==================== TRAIT IMPLEMENTATIONS ====================

#[async_trait]
impl TokenRegistryRepository for PostgresClient {
    async fn upsert(&self, record: &TokenRegistryRecord) -> Result<(), PricingError> {
        self.set_token_registry(record)
            .await
            .map_err(PricingError::Storage)
    }

    async fn get_by_token_address(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Option<TokenRegistryRecord>, PricingError> {
        self.get_token_registry(chain, token_address)
            .await
            .map_err(PricingError::Storage)
    }

    async fn list_all(&self, chain: Option<&str>) -> Result<Vec<TokenRegistryRecord>, PricingError> {
        self.list_token_registry(chain)
            .await
            .map_err(PricingError::Storage)
    }
}

#[async_trait]
impl RuntimeConfigSource for PostgresClient {
    async fn get_runtime(&self) -> Result<Option<RuntimeConfig>, PricingError> {
        self.get_system_config().await.map_err(PricingError::Storage)
    }
}
