//! Pool state provider backed by The Graph.

mod client;
mod pool;

use async_trait::async_trait;

use crate::pricing::PricingError;

pub use client::{TheGraphClient, POOL_QUERY};
pub use pool::{PoolSide, PoolState, PoolToken};

/// Parameters of a single pool-state fetch.
#[derive(Debug, Clone, Copy)]
pub struct PoolQuery<'a> {
    /// Lower-cased pool address
    pub pool_address: &'a str,
    /// Index-source override; `None` uses the provider default
    pub subgraph_id: Option<&'a str>,
    pub api_key: &'a str,
}

/// Source of live pool state.
///
/// Implementations must fail rather than hang: a timed out request surfaces
/// as an upstream error and is not retried.
#[async_trait]
pub trait PoolStateProvider: Send + Sync {
    async fn get_pool(&self, query: PoolQuery<'_>) -> Result<PoolState, PricingError>;
}
