//! Token USD pricing.
//!
//! - [`decoder`] - pool state to price-in-quote
//! - [`resolver`] - recursive USD resolution through quote tokens
//! - [`registration`] - registry write path

pub mod decoder;
mod error;
pub mod registration;
pub mod resolver;
mod result;

#[cfg(test)]
pub(crate) mod testing;

pub use decoder::{decode_price_in_quote, PriceDirection};
pub use error::{ErrorKind, PricingError};
pub use registration::{RegisterFromPool, TokenRegistrar};
pub use resolver::{PriceResolver, MAX_QUOTE_DEPTH};
pub use result::TokenPriceResult;
