//! Shared helpers for config resolution.

use alloy_primitives::{Address, U256};
use url::Url;

use crate::error::ConfigError;

/// Read an env var, treating unset and blank as absent.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: error.to_string(),
        }),
    }
}

pub(crate) fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}' is not a valid 0x address"),
        })
}

/// Parse a decimal wei amount.
pub(crate) fn parse_wei(key: &str, value: &str) -> Result<U256, ConfigError> {
    U256::from_str_radix(value.trim(), 10).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}' is not a valid wei amount: {e}"),
    })
}

pub(crate) fn parse_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}' is not a valid URL: {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("scheme '{}' is not http(s)", url.scheme()),
        });
    }
    Ok(url)
}

/// Comma-separated address list.
pub(crate) fn parse_address_list(key: &str, value: &str) -> Result<Vec<Address>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| parse_address(key, chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_list_splits_and_trims() {
        let list = parse_address_list(
            "TEST",
            " 0x1111111111111111111111111111111111111111 ,0x2222222222222222222222222222222222222222,",
        )
        .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn wei_amounts_are_decimal() {
        assert_eq!(parse_wei("TEST", "1000").unwrap(), U256::from(1000u64));
        assert!(parse_wei("TEST", "0x10").is_err());
    }

    #[test]
    fn only_http_schemes_are_accepted() {
        assert!(parse_http_url("TEST", "https://rpc.example").is_ok());
        assert!(parse_http_url("TEST", "ftp://rpc.example").is_err());
    }
}
