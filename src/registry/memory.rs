use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{TokenRegistryRecord, TokenRegistryRepository};
use crate::pricing::PricingError;

/// Token registry held in process memory, keyed by `(chain, token_address)`.
#[derive(Debug, Default)]
pub struct InMemoryTokenRegistry {
    records: RwLock<BTreeMap<(String, String), TokenRegistryRecord>>,
}

impl InMemoryTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry with records as-is (no timestamp is stamped).
    pub fn with_records(records: impl IntoIterator<Item = TokenRegistryRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| ((r.chain.clone(), r.token_address.clone()), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TokenRegistryRepository for InMemoryTokenRegistry {
    async fn upsert(&self, record: &TokenRegistryRecord) -> Result<(), PricingError> {
        let mut stored = record.clone();
        stored.updated_at = Some(Utc::now());
        self.records
            .write()
            .await
            .insert((stored.chain.clone(), stored.token_address.clone()), stored);
        Ok(())
    }

    async fn get_by_token_address(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Option<TokenRegistryRecord>, PricingError> {
        let key = (chain.trim().to_lowercase(), token_address.trim().to_lowercase());
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn list_all(&self, chain: Option<&str>) -> Result<Vec<TokenRegistryRecord>, PricingError> {
        let chain = chain.map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty());
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| chain.as_deref().map_or(true, |c| r.chain == c))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::testing::record;

    #[tokio::test]
    async fn test_upsert_replaces_by_key() {
        let registry = InMemoryTokenRegistry::new();
        let mut r = record("base", "0x00000000000000000000000000000000000000a1", "0x00000000000000000000000000000000000000b1", true);
        registry.upsert(&r).await.unwrap();

        r.pool_address = "0x00000000000000000000000000000000000000f2".to_string();
        registry.upsert(&r).await.unwrap();

        assert_eq!(registry.len().await, 1);
        let stored = registry
            .get_by_token_address(" BASE ", "0x00000000000000000000000000000000000000A1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.pool_address, "0x00000000000000000000000000000000000000f2");
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_list_all_filters_by_chain() {
        let registry = InMemoryTokenRegistry::with_records([
            record("base", "0x00000000000000000000000000000000000000a1", "0x00000000000000000000000000000000000000b1", true),
            record("base", "0x00000000000000000000000000000000000000a2", "0x00000000000000000000000000000000000000b1", true),
            record("arbitrum", "0x00000000000000000000000000000000000000a3", "0x00000000000000000000000000000000000000b1", true),
        ]);

        assert_eq!(registry.list_all(None).await.unwrap().len(), 3);
        let base = registry.list_all(Some("base")).await.unwrap();
        assert_eq!(base.len(), 2);
        assert!(base.iter().all(|r| r.chain == "base"));
        assert!(registry.list_all(Some("optimism")).await.unwrap().is_empty());
    }
}
