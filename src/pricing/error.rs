//! Error types for token pricing and registration.
//!
//! Every variant maps to a stable machine-readable [`code`](PricingError::code)
//! and a coarse [`ErrorKind`], so boundary layers can translate failures to
//! transport status without matching on the human message.

use thiserror::Error;

/// Coarse classification of a [`PricingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input or missing credential.
    Validation,
    /// A registry record that should exist does not.
    NotFound,
    /// The quote resolution graph is cyclic or too deep.
    Graph,
    /// The indexer returned data that cannot be priced.
    UpstreamData,
    /// Exact arithmetic or numeric parsing failed.
    Computation,
    /// The indexer could not be reached or rejected the request.
    Upstream,
    /// The registry store failed.
    Storage,
    /// The caller cancelled the resolution.
    Cancelled,
}

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Invalid EVM address for {field}: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("The Graph API key is not configured")]
    ApiKeyMissing,

    #[error("Invalid subgraph id: {value:?}")]
    InvalidSubgraphId { value: String },

    #[error("Token {chain}:{token_address} is not registered")]
    TokenNotRegistered { chain: String, token_address: String },

    #[error("Quote token {chain}:{token_address} is not registered")]
    QuoteTokenNotRegistered { chain: String, token_address: String },

    #[error("Quote resolution cycle at {key}")]
    QuoteResolutionCycle { key: String },

    #[error("Quote resolution exceeded {max_depth} hops")]
    QuoteResolutionDepthExceeded { max_depth: u8 },

    #[error("Pool {pool_address} is missing a token side")]
    PoolTokenSidesMissing { pool_address: String },

    #[error("Pool {pool_address} is missing token decimals")]
    PoolTokenDecimalsMissing { pool_address: String },

    #[error("Pool {pool_address} has neither sqrtPrice nor token prices")]
    PoolPricesMissing { pool_address: String },

    #[error("Registry record for {token_address} has no decimals for its pool side")]
    RegistryMissingDecimals { token_address: String },

    #[error("Token {token_address} is not a side of pool {pool_address}")]
    TokenNotInPool { token_address: String, pool_address: String },

    #[error("sqrtPrice of pool {pool_address} yields a zero ratio")]
    InvalidSqrtPriceRatio { pool_address: String },

    #[error("Failed to compute price in quote for pool {pool_address}")]
    FailedToComputePriceInQuote { pool_address: String },

    #[error("Invalid numeric field {field}: {value:?}")]
    InvalidNumericField { field: &'static str, value: String },

    #[error("The Graph request timed out: {0}")]
    UpstreamTimeout(#[source] reqwest::Error),

    #[error("The Graph returned HTTP {status}")]
    UpstreamHttp { status: u16 },

    #[error("The Graph query failed: {message}")]
    UpstreamQuery { message: String },

    #[error("The Graph request failed: {0}")]
    UpstreamRequest(#[source] reqwest::Error),

    #[error("The Graph response could not be decoded: {message}")]
    UpstreamInvalidResponse { message: String },

    #[error("Token registry storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("Price resolution cancelled")]
    Cancelled,
}

impl PricingError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_evm_address",
            Self::ApiKeyMissing => "thegraph_api_key_missing",
            Self::InvalidSubgraphId { .. } => "invalid_subgraph_id",
            Self::TokenNotRegistered { .. } => "token_not_registered",
            Self::QuoteTokenNotRegistered { .. } => "quote_token_not_registered",
            Self::QuoteResolutionCycle { .. } => "quote_resolution_cycle",
            Self::QuoteResolutionDepthExceeded { .. } => "quote_resolution_depth_exceeded",
            Self::PoolTokenSidesMissing { .. } => "pool_token_sides_missing",
            Self::PoolTokenDecimalsMissing { .. } => "pool_token_decimals_missing",
            Self::PoolPricesMissing { .. } => "pool_prices_missing",
            Self::RegistryMissingDecimals { .. } => "registry_missing_decimals",
            Self::TokenNotInPool { .. } => "token_not_in_pool",
            Self::InvalidSqrtPriceRatio { .. } => "invalid_sqrt_price_ratio",
            Self::FailedToComputePriceInQuote { .. } => "failed_to_compute_price_in_quote",
            Self::InvalidNumericField { .. } => "invalid_numeric_field",
            Self::UpstreamTimeout(_) => "thegraph_timeout",
            Self::UpstreamHttp { .. } => "thegraph_http_error",
            Self::UpstreamQuery { .. } => "thegraph_query_error",
            Self::UpstreamRequest(_) => "thegraph_request_failed",
            Self::UpstreamInvalidResponse { .. } => "thegraph_invalid_response",
            Self::Storage(_) => "registry_storage_error",
            Self::Cancelled => "resolution_cancelled",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress { .. } | Self::ApiKeyMissing | Self::InvalidSubgraphId { .. } => {
                ErrorKind::Validation
            },

            Self::TokenNotRegistered { .. } | Self::QuoteTokenNotRegistered { .. } => {
                ErrorKind::NotFound
            },

            Self::QuoteResolutionCycle { .. } | Self::QuoteResolutionDepthExceeded { .. } => {
                ErrorKind::Graph
            },

            Self::PoolTokenSidesMissing { .. }
            | Self::PoolTokenDecimalsMissing { .. }
            | Self::PoolPricesMissing { .. }
            | Self::RegistryMissingDecimals { .. }
            | Self::TokenNotInPool { .. } => ErrorKind::UpstreamData,

            Self::InvalidSqrtPriceRatio { .. }
            | Self::FailedToComputePriceInQuote { .. }
            | Self::InvalidNumericField { .. } => ErrorKind::Computation,

            Self::UpstreamTimeout(_)
            | Self::UpstreamHttp { .. }
            | Self::UpstreamQuery { .. }
            | Self::UpstreamRequest(_)
            | Self::UpstreamInvalidResponse { .. } => ErrorKind::Upstream,

            Self::Storage(_) => ErrorKind::Storage,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<reqwest::Error> for PricingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::UpstreamTimeout(e)
        } else if e.is_decode() {
            Self::UpstreamInvalidResponse {
                message: e.to_string(),
            }
        } else {
            Self::UpstreamRequest(e)
        }
    }
}
