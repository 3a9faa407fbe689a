use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// PostgreSQL database connection configuration.
///
/// Used for storing:
/// - The token registry (pool + quote per token)
/// - The runtime system configuration row (indexer API key)
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    16
}

/// The Graph gateway configuration.
///
/// Pool state is queried from `{gateway_base_url}{subgraph_id}`. A registry
/// record may override the subgraph id; otherwise `default_subgraph_id` is used.
#[derive(Debug, Deserialize, Clone)]
pub struct TheGraphSettings {
    #[serde(default = "default_gateway_base_url")]
    pub gateway_base_url: String,
    #[serde(default = "default_subgraph_id")]
    pub default_subgraph_id: String,
    /// Static API key. When unset the key is read from the database at runtime.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Total request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_gateway_base_url() -> String {
    "https://gateway.thegraph.com/api/subgraphs/id/".to_string()
}

fn default_subgraph_id() -> String {
    // PancakeSwap V3 on Base
    "BHWNsedAHtmTCzXxCCDfhPmm6iN9rxUhoRHdHKyujic3".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for TheGraphSettings {
    fn default() -> Self {
        Self {
            gateway_base_url: default_gateway_base_url(),
            default_subgraph_id: default_subgraph_id(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Pricing and registration defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct PricingSettings {
    #[serde(default = "default_chain")]
    pub default_chain: String,
    #[serde(default = "default_dex")]
    pub default_dex: String,
    /// Quote symbols treated as pegged 1:1 to USD when registering a token
    /// without an explicit stability override.
    #[serde(default = "default_usd_stable_symbols")]
    pub usd_stable_symbols: Vec<String>,
}

fn default_chain() -> String {
    "base".to_string()
}

fn default_dex() -> String {
    "pancakeswap_v3".to_string()
}

fn default_usd_stable_symbols() -> Vec<String> {
    ["USDC", "USDT", "DAI", "USDBC"].iter().map(|s| s.to_string()).collect()
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_chain: default_chain(),
            default_dex: default_dex(),
            usd_stable_symbols: default_usd_stable_symbols(),
        }
    }
}

impl PricingSettings {
    /// Check a quote symbol against the USD-stable allow-list (case-insensitive).
    pub fn is_usd_stable_symbol(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return false;
        }
        self.usd_stable_symbols
            .iter()
            .any(|s| s.trim().to_uppercase() == symbol)
    }
}

/// Root application configuration.
///
/// Loaded from an optional `config.yaml`, then overridden by environment
/// variables prefixed with `PRICING` (e.g. `PRICING_THEGRAPH__API_KEY`).
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub thegraph: TheGraphSettings,
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(env_source())
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Build settings from an inline YAML document, still honoring env overrides.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        s.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("PRICING")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("pricing.usd_stable_symbols")
        .try_parsing(true)
}
