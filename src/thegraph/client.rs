use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{PoolQuery, PoolState, PoolStateProvider};
use crate::config::TheGraphSettings;
use crate::pricing::PricingError;

/// Pool query shared by registration and pricing.
///
/// Volume and TVL are not used for pricing but are part of the shared shape.
pub const POOL_QUERY: &str = r#"
query Pool($id: ID!) {
  pool(id: $id) {
    id
    feeTier
    liquidity
    sqrtPrice
    tick
    token0Price
    token1Price
    volumeUSD
    totalValueLockedUSD
    token0 { id symbol decimals }
    token1 { id symbol decimals }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphErrorMessage>>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorMessage {
    #[serde(default)]
    message: String,
}

/// GraphQL client for The Graph gateway.
///
/// One `reqwest::Client` is shared across requests. Every request is bounded
/// by a connect timeout and a total timeout; nothing is retried here.
#[derive(Clone)]
pub struct TheGraphClient {
    http: reqwest::Client,
    gateway_base_url: Url,
    default_subgraph_id: String,
}

impl TheGraphClient {
    pub fn new(settings: &TheGraphSettings) -> anyhow::Result<Self> {
        let mut base = settings.gateway_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let gateway_base_url = Url::parse(&base)
            .with_context(|| format!("Invalid The Graph gateway URL: {}", base))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build The Graph HTTP client")?;

        Ok(Self {
            http,
            gateway_base_url,
            default_subgraph_id: settings.default_subgraph_id.trim().to_string(),
        })
    }

    /// Resolve the query endpoint for an optional subgraph override.
    pub fn endpoint(&self, subgraph_id: Option<&str>) -> Result<Url, PricingError> {
        let id = subgraph_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.default_subgraph_id.as_str());

        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PricingError::InvalidSubgraphId {
                value: id.to_string(),
            });
        }

        self.gateway_base_url
            .join(id)
            .map_err(|_| PricingError::InvalidSubgraphId {
                value: id.to_string(),
            })
    }

    /// Execute a GraphQL query and return its `data` object.
    pub async fn query(
        &self,
        endpoint: Url,
        api_key: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, PricingError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| {
                warn!("[THEGRAPH] Request failed: {}", e);
                PricingError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("[THEGRAPH] Gateway returned HTTP {}", status);
            return Err(PricingError::UpstreamHttp {
                status: status.as_u16(),
            });
        }

        let body: GraphResponse = response.json().await?;
        decode_response(body)
    }
}

fn decode_response(body: GraphResponse) -> Result<Value, PricingError> {
    if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        warn!("[THEGRAPH] Query returned errors: {}", message);
        return Err(PricingError::UpstreamQuery {
            message,
        });
    }
    Ok(body.data.unwrap_or(Value::Null))
}

/// Extract the pool object from a query `data` payload.
fn pool_from_data(data: Value) -> Result<PoolState, PricingError> {
    let pool = match data {
        Value::Object(mut map) => map.remove("pool").unwrap_or(Value::Null),
        _ => Value::Null,
    };
    PoolState::from_graph_json(pool)
}

#[async_trait]
impl PoolStateProvider for TheGraphClient {
    async fn get_pool(&self, query: PoolQuery<'_>) -> Result<PoolState, PricingError> {
        let endpoint = self.endpoint(query.subgraph_id)?;
        let pool_id = query.pool_address.trim().to_lowercase();

        debug!("[THEGRAPH] Fetching pool {} from {}", pool_id, endpoint);

        let data = self
            .query(endpoint, query.api_key, POOL_QUERY, json!({ "id": pool_id }))
            .await?;
        pool_from_data(data)
    }
}
