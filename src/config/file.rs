//! Optional TOML configuration file overlay.
//!
//! File values sit between env vars and built-in defaults:
//! env var > `~/.curio/config.toml` > default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub agent: FileAgent,
    #[serde(default)]
    pub chain: FileChain,
    #[serde(default)]
    pub gating: FileGating,
    #[serde(default)]
    pub contracts: FileContracts,
    #[serde(default)]
    pub mint_prices: FileMintPrices,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileAgent {
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileChain {
    pub rpc_url: Option<String>,
    pub registry_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileGating {
    /// Gated collection contract addresses, in check order.
    pub collections: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileContracts {
    pub provenance: Option<String>,
    pub minting: Option<String>,
    pub community: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileMintPrices {
    /// Decimal wei amounts.
    pub basic: Option<String>,
    pub premium: Option<String>,
    pub vip: Option<String>,
}

impl FileSettings {
    /// Default config file location: `~/.curio/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".curio")
            .join("config.toml")
    }

    /// Load from a path. `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        Ok(Some(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_files() {
        let settings: FileSettings = toml::from_str(
            r#"
            [chain]
            rpc_url = "https://rpc.example"

            [gating]
            collections = ["0x1111111111111111111111111111111111111111"]
            "#,
        )
        .expect("partial file parses");
        assert_eq!(settings.chain.rpc_url.as_deref(), Some("https://rpc.example"));
        assert_eq!(
            settings.gating.collections.as_ref().map(Vec::len),
            Some(1)
        );
        assert!(settings.agent.address.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let settings: FileSettings = toml::from_str("").expect("empty file parses");
        assert!(settings.contracts.minting.is_none());
        assert!(settings.mint_prices.vip.is_none());
    }
}
