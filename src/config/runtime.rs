//! Runtime configuration resolved per call.
//!
//! The indexer credential is not baked into the engine. Each resolution asks
//! an injected [`RuntimeConfigSource`] once and passes the key down explicitly.

use async_trait::async_trait;
use serde::Deserialize;

use crate::pricing::PricingError;

/// Runtime values that may change without a restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    pub index_api_key: Option<String>,
}

impl RuntimeConfig {
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            index_api_key: Some(key.into()),
        }
    }

    /// The trimmed API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.index_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Accessor for [`RuntimeConfig`].
///
/// Returns `Ok(None)` when no runtime configuration exists yet.
#[async_trait]
pub trait RuntimeConfigSource: Send + Sync {
    async fn get_runtime(&self) -> Result<Option<RuntimeConfig>, PricingError>;
}

/// A fixed configuration, typically taken from [`Settings`](super::Settings).
#[async_trait]
impl RuntimeConfigSource for RuntimeConfig {
    async fn get_runtime(&self) -> Result<Option<RuntimeConfig>, PricingError> {
        Ok(Some(self.clone()))
    }
}

/// Fetch the indexer API key, failing with `thegraph_api_key_missing` when absent.
pub async fn require_api_key(source: &dyn RuntimeConfigSource) -> Result<String, PricingError> {
    let runtime = source.get_runtime().await?;
    runtime
        .as_ref()
        .and_then(RuntimeConfig::api_key)
        .map(str::to_string)
        .ok_or(PricingError::ApiKeyMissing)
}
