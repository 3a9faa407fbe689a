//! EVM address and label normalization.
//!
//! All identities are stored lower-cased and trimmed so registry keys and pool
//! side comparisons never depend on checksum casing.

use alloy::primitives::Address;
use std::str::FromStr;

use crate::pricing::PricingError;

/// Check that a string is shaped like an EVM address: `0x` + 40 hex chars.
pub fn is_evm_address(value: &str) -> bool {
    value.len() == 42
        && (value.starts_with("0x") || value.starts_with("0X"))
        && Address::from_str(value).is_ok()
}

/// Trim, lower-case and validate an address supplied by a caller.
///
/// `field` names the input in the returned error.
pub fn normalize_address(raw: &str, field: &'static str) -> Result<String, PricingError> {
    let value = raw.trim().to_lowercase();
    if !is_evm_address(&value) {
        return Err(PricingError::InvalidAddress {
            field,
            value,
        });
    }
    Ok(value)
}

/// Trim and lower-case a free-form label, falling back to `default` when blank.
pub fn normalize_label(raw: &str, default: &str) -> String {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        default.trim().to_lowercase()
    } else {
        value
    }
}

/// Trim an optional value, mapping blank strings to `None`.
pub fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address_lowercases() {
        let addr = normalize_address(" 0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913 ", "token_address")
            .unwrap();
        assert_eq!(addr, "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
    }

    #[test]
    fn test_normalize_address_rejects_malformed() {
        for bad in ["", "0x1234", "833589fcd6edb6e08f4c7c32d4f71b54bda029130x", "0xzz3589fcd6edb6e08f4c7c32d4f71b54bda02913"] {
            let err = normalize_address(bad, "pool_address").unwrap_err();
            assert_eq!(err.code(), "invalid_evm_address");
        }
    }

    #[test]
    fn test_normalize_label_defaults() {
        assert_eq!(normalize_label("  ", "base"), "base");
        assert_eq!(normalize_label(" Arbitrum ", "base"), "arbitrum");
    }

    #[test]
    fn test_normalize_optional_blank_is_none() {
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(Some(" abc ")), Some("abc".to_string()));
        assert_eq!(normalize_optional(None), None);
    }
}
