mod config;
mod runtime;

pub use self::config::{PostgresSettings, PricingSettings, Settings, TheGraphSettings};
pub use self::runtime::{require_api_key, RuntimeConfig, RuntimeConfigSource};
