//! Token registry contract.
//!
//! The pricing engine only reads through [`TokenRegistryRepository`];
//! registration is the single write path. Implementations:
//!
//! - [`PostgresClient`](crate::db::PostgresClient) - production store
//! - [`InMemoryTokenRegistry`] - process-local store

mod memory;

use async_trait::async_trait;

use crate::pricing::PricingError;

pub use crate::db::models::TokenRegistryRecord;
pub use memory::InMemoryTokenRegistry;

#[async_trait]
pub trait TokenRegistryRepository: Send + Sync {
    /// Insert or replace the record keyed by `(chain, token_address)`.
    async fn upsert(&self, record: &TokenRegistryRecord) -> Result<(), PricingError>;

    async fn get_by_token_address(
        &self,
        chain: &str,
        token_address: &str,
    ) -> Result<Option<TokenRegistryRecord>, PricingError>;

    /// All records, optionally restricted to one chain, ordered by key.
    async fn list_all(&self, chain: Option<&str>) -> Result<Vec<TokenRegistryRecord>, PricingError>;
}
