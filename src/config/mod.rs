//! Configuration for Curio.
//!
//! Resolution priority per key: env var > TOML config file > default.
//! `~/.curio/.env` is loaded via dotenvy early in startup (see
//! `crate::bootstrap`); everything else comes from env vars or the config
//! file.

pub(crate) mod helpers;

mod file;

use alloy_primitives::{Address, U256};
use url::Url;

use crate::error::ConfigError;

use self::helpers::{optional_env, parse_address, parse_address_list, parse_http_url, parse_wei};

pub use self::file::FileSettings;

/// Main configuration for the agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub agent: AgentConfig,
    pub chain: ChainConfig,
    pub gating: GatingConfig,
    pub contracts: ContractsConfig,
    pub mint_prices: MintPriceConfig,
}

/// Agent identity on the messaging transport.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The agent's own sender address; inbound messages from it are dropped.
    pub address: String,
}

impl AgentConfig {
    fn resolve(settings: &FileSettings) -> Result<Self, ConfigError> {
        let address = optional_env("CURIO_AGENT_ADDRESS")?
            .or_else(|| settings.agent.address.clone())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "CURIO_AGENT_ADDRESS".to_string(),
                hint: "Set it to the agent's messaging address (also [agent].address in config.toml)."
                    .to_string(),
            })?;
        Ok(Self {
            address: address.trim().to_ascii_lowercase(),
        })
    }
}

/// On-chain read endpoints.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: Url,
    pub registry_url: Url,
    pub timeout_ms: u64,
}

impl ChainConfig {
    fn resolve(settings: &FileSettings) -> Result<Self, ConfigError> {
        let rpc_raw = optional_env("CURIO_RPC_URL")?
            .or_else(|| settings.chain.rpc_url.clone())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "CURIO_RPC_URL".to_string(),
                hint: "Set it to a JSON-RPC HTTP endpoint (also [chain].rpc_url in config.toml)."
                    .to_string(),
            })?;
        let registry_raw = optional_env("CURIO_REGISTRY_URL")?
            .or_else(|| settings.chain.registry_url.clone())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "CURIO_REGISTRY_URL".to_string(),
                hint: "Set it to the collection metadata registry base URL.".to_string(),
            })?;

        let timeout_ms = optional_env("CURIO_RPC_TIMEOUT_MS")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "CURIO_RPC_TIMEOUT_MS".to_string(),
                message: format!("must be a positive integer: {e}"),
            })?
            .or(settings.chain.timeout_ms)
            .unwrap_or(10_000);
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CURIO_RPC_TIMEOUT_MS".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            rpc_url: parse_http_url("CURIO_RPC_URL", &rpc_raw)?,
            registry_url: parse_http_url("CURIO_REGISTRY_URL", &registry_raw)?,
            timeout_ms,
        })
    }
}

/// Collections whose ownership gates access, in check order.
#[derive(Debug, Clone)]
pub struct GatingConfig {
    pub collections: Vec<Address>,
}

impl GatingConfig {
    fn resolve(settings: &FileSettings) -> Result<Self, ConfigError> {
        let collections = match optional_env("CURIO_COLLECTIONS")? {
            Some(raw) => parse_address_list("CURIO_COLLECTIONS", &raw)?,
            None => settings
                .gating
                .collections
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|raw| parse_address("gating.collections", raw))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self { collections })
    }
}

/// Fixed target contracts for transaction construction.
#[derive(Debug, Clone, Copy)]
pub struct ContractsConfig {
    pub provenance: Address,
    pub minting: Address,
    pub community: Address,
}

impl ContractsConfig {
    fn resolve(settings: &FileSettings) -> Result<Self, ConfigError> {
        let resolve_one = |env_key: &str,
                           file_value: Option<&String>|
         -> Result<Address, ConfigError> {
            let raw = optional_env(env_key)?
                .or_else(|| file_value.cloned())
                .ok_or_else(|| ConfigError::MissingRequired {
                    key: env_key.to_string(),
                    hint: "Set it to the deployed contract address (also under [contracts] in config.toml)."
                        .to_string(),
                })?;
            parse_address(env_key, &raw)
        };

        Ok(Self {
            provenance: resolve_one(
                "CURIO_PROVENANCE_CONTRACT",
                settings.contracts.provenance.as_ref(),
            )?,
            minting: resolve_one("CURIO_MINTING_CONTRACT", settings.contracts.minting.as_ref())?,
            community: resolve_one(
                "CURIO_COMMUNITY_CONTRACT",
                settings.contracts.community.as_ref(),
            )?,
        })
    }
}

/// Mint prices in wei, keyed by tier.
#[derive(Debug, Clone, Copy)]
pub struct MintPriceConfig {
    pub basic: U256,
    pub premium: U256,
    pub vip: U256,
}

impl MintPriceConfig {
    fn resolve(settings: &FileSettings) -> Result<Self, ConfigError> {
        let resolve_one = |env_key: &str,
                           file_value: Option<&String>,
                           default: U256|
         -> Result<U256, ConfigError> {
            match optional_env(env_key)?.or_else(|| file_value.cloned()) {
                Some(raw) => parse_wei(env_key, &raw),
                None => Ok(default),
            }
        };

        Ok(Self {
            basic: resolve_one(
                "CURIO_MINT_PRICE_BASIC_WEI",
                settings.mint_prices.basic.as_ref(),
                U256::ZERO,
            )?,
            premium: resolve_one(
                "CURIO_MINT_PRICE_PREMIUM_WEI",
                settings.mint_prices.premium.as_ref(),
                U256::from(10_000_000_000_000_000u64),
            )?,
            vip: resolve_one(
                "CURIO_MINT_PRICE_VIP_WEI",
                settings.mint_prices.vip.as_ref(),
                U256::from(50_000_000_000_000_000u64),
            )?,
        })
    }
}

impl Config {
    /// Load configuration from env vars and the default config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_toml(None)
    }

    /// Load with an explicit TOML config file.
    ///
    /// An explicit path must exist; the default path is silently skipped
    /// when missing.
    pub fn from_env_with_toml(toml_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        crate::bootstrap::load_curio_env();

        let path = toml_path
            .map(std::path::PathBuf::from)
            .unwrap_or_else(FileSettings::default_path);
        let settings = match FileSettings::load(&path)? {
            Some(settings) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                settings
            }
            None => {
                if toml_path.is_some() {
                    return Err(ConfigError::ParseError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                FileSettings::default()
            }
        };

        Self::build(&settings)
    }

    fn build(settings: &FileSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            agent: AgentConfig::resolve(settings)?,
            chain: ChainConfig::resolve(settings)?,
            gating: GatingConfig::resolve(settings)?,
            contracts: ContractsConfig::resolve(settings)?,
            mint_prices: MintPriceConfig::resolve(settings)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ADDR_A: &str = "0x1111111111111111111111111111111111111111";
    const ADDR_B: &str = "0x2222222222222222222222222222222222222222";

    fn clear_curio_env() {
        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::remove_var("CURIO_AGENT_ADDRESS");
            std::env::remove_var("CURIO_RPC_URL");
            std::env::remove_var("CURIO_REGISTRY_URL");
            std::env::remove_var("CURIO_RPC_TIMEOUT_MS");
            std::env::remove_var("CURIO_COLLECTIONS");
            std::env::remove_var("CURIO_PROVENANCE_CONTRACT");
            std::env::remove_var("CURIO_MINTING_CONTRACT");
            std::env::remove_var("CURIO_COMMUNITY_CONTRACT");
            std::env::remove_var("CURIO_MINT_PRICE_BASIC_WEI");
            std::env::remove_var("CURIO_MINT_PRICE_PREMIUM_WEI");
            std::env::remove_var("CURIO_MINT_PRICE_VIP_WEI");
        }
    }

    fn full_settings() -> FileSettings {
        toml::from_str(&format!(
            r#"
            [agent]
            address = "0xAgentAddressFromFile"

            [chain]
            rpc_url = "https://rpc.example"
            registry_url = "https://registry.example/v1/"

            [gating]
            collections = ["{ADDR_A}", "{ADDR_B}"]

            [contracts]
            provenance = "{ADDR_A}"
            minting = "{ADDR_B}"
            community = "{ADDR_A}"

            [mint_prices]
            vip = "777"
            "#
        ))
        .expect("settings parse")
    }

    #[test]
    fn file_values_fill_in_when_env_is_unset() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_curio_env();

        let config = Config::build(&full_settings()).expect("config builds");
        assert_eq!(config.agent.address, "0xagentaddressfromfile");
        assert_eq!(config.chain.rpc_url.as_str(), "https://rpc.example/");
        assert_eq!(config.chain.timeout_ms, 10_000);
        assert_eq!(config.gating.collections.len(), 2);
        assert_eq!(config.mint_prices.vip, U256::from(777u64));
        // Unset prices keep their defaults.
        assert_eq!(
            config.mint_prices.premium,
            U256::from(10_000_000_000_000_000u64)
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_curio_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CURIO_AGENT_ADDRESS", "0xFromEnv");
            std::env::set_var("CURIO_COLLECTIONS", ADDR_B);
            std::env::set_var("CURIO_MINT_PRICE_VIP_WEI", "1234");
        }

        let config = Config::build(&full_settings()).expect("config builds");
        assert_eq!(config.agent.address, "0xfromenv");
        assert_eq!(
            config.gating.collections,
            vec![ADDR_B.parse::<Address>().unwrap()]
        );
        assert_eq!(config.mint_prices.vip, U256::from(1234u64));

        clear_curio_env();
    }

    #[test]
    fn missing_required_keys_name_the_key() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_curio_env();

        let err = Config::build(&FileSettings::default()).unwrap_err();
        match err {
            ConfigError::MissingRequired { key, .. } => {
                assert_eq!(key, "CURIO_AGENT_ADDRESS")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_values_are_rejected_with_key_context() {
        let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        clear_curio_env();

        // SAFETY: Guarded by ENV_MUTEX in tests.
        unsafe {
            std::env::set_var("CURIO_RPC_TIMEOUT_MS", "0");
        }

        let err = Config::build(&full_settings()).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "CURIO_RPC_TIMEOUT_MS"),
            other => panic!("unexpected error: {other}"),
        }

        clear_curio_env();
    }
}
