use bigdecimal::BigDecimal;
use serde::{Serialize, Serializer};

use crate::utils::decimal_to_plain_string;

/// USD price of a registered token.
///
/// `price_usd` and `price_in_quote` serialize as plain decimal strings so no
/// precision is lost across a process boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPriceResult {
    pub chain: String,
    pub token_address: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub price_usd: BigDecimal,
    pub quote_token_address: String,
    /// Whether this token's direct quote is USD-stable (not the terminus of the chain)
    pub quote_token_is_usd_stable: bool,
    /// Quote units per one unit of the token
    #[serde(serialize_with = "serialize_decimal")]
    pub price_in_quote: BigDecimal,
    pub pool_address: String,
    /// The priced token's own decimal count
    pub decimals: u8,
}

fn serialize_decimal<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&decimal_to_plain_string(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_prices_serialize_as_plain_strings() {
        let result = TokenPriceResult {
            chain: "base".to_string(),
            token_address: "0xaaa".to_string(),
            price_usd: BigDecimal::from_str("1.2e-20").unwrap(),
            quote_token_address: "0xbbb".to_string(),
            quote_token_is_usd_stable: true,
            price_in_quote: BigDecimal::from_str("244140625.000").unwrap(),
            pool_address: "0xccc".to_string(),
            decimals: 18,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["price_usd"], "0.000000000000000000012");
        assert_eq!(json["price_in_quote"], "244140625");
        assert_eq!(json["decimals"], 18);
        assert_eq!(json["quote_token_is_usd_stable"], true);
    }
}
