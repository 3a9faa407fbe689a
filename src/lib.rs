pub mod config;
pub mod db;
pub mod pricing;
pub mod registry;
pub mod thegraph;
pub mod utils;

pub use config::{RuntimeConfig, RuntimeConfigSource, Settings};
pub use db::PostgresClient;
pub use pricing::{PriceResolver, PricingError, TokenPriceResult, TokenRegistrar};
pub use registry::{InMemoryTokenRegistry, TokenRegistryRecord, TokenRegistryRepository};
pub use thegraph::{PoolState, PoolStateProvider, TheGraphClient};
