use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::Level;

use crate::chains::{ChainRegistry, BASE};
use crate::error::{Result, SwapError};

pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 0.5;
/// 30 minutes.
pub const DEFAULT_DEADLINE_SECS: i64 = 1800;
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub chain_id: u64,
    pub slippage_percent: f64,
    pub deadline_secs: i64,
    pub gas_limit: u64,
    pub log_level: String,
    /// Overrides keyed by chain id, e.g. `[rpc_urls]` / `8453 = "..."`.
    pub rpc_urls: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: BASE,
            slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            gas_limit: DEFAULT_GAS_LIMIT,
            log_level: "info".to_string(),
            rpc_urls: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SwapError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Falls back to defaults when `path` does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        // Simple env var substitution: replace ${VAR} with env value
        let content = Self::substitute_env_vars(content)?;

        let config: Config =
            toml::from_str(&content).map_err(|e| SwapError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..100.0).contains(&self.slippage_percent) {
            return Err(SwapError::Config(format!(
                "slippage_percent must be in [0, 100), got {}",
                self.slippage_percent
            )));
        }
        if self.deadline_secs <= 0 {
            return Err(SwapError::Config("deadline_secs must be > 0".to_string()));
        }
        if self.gas_limit == 0 {
            return Err(SwapError::Config("gas_limit must be > 0".to_string()));
        }
        self.level()?;
        self.rpc_overrides().map(|_| ())
    }

    /// `log_level` as a tracing level (`trace` .. `error`).
    pub fn level(&self) -> Result<Level> {
        self.log_level.parse::<Level>().map_err(|_| {
            SwapError::Config(format!("log_level {:?} is not a tracing level", self.log_level))
        })
    }

    pub fn rpc_overrides(&self) -> Result<BTreeMap<u64, String>> {
        self.rpc_urls
            .iter()
            .map(|(chain_id, url)| {
                let chain_id = chain_id.parse::<u64>().map_err(|_| {
                    SwapError::Config(format!("rpc_urls key {:?} is not a chain id", chain_id))
                })?;
                Ok((chain_id, url.clone()))
            })
            .collect()
    }

    /// Builtin chains with `*_RPC_URL` env overrides, then config overrides.
    pub fn chain_registry(&self) -> Result<ChainRegistry> {
        Ok(ChainRegistry::from_env().with_rpc_overrides(&self.rpc_overrides()?))
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();
        let mut cursor = 0;
        while let Some(offset) = result[cursor..].find("${") {
            let start = cursor + offset;
            if let Some(end) = result[start..].find('}') {
                let var_name = &result[start + 2..start + end];
                let value = std::env::var(var_name).map_err(|_| {
                    SwapError::Config(format!(
                        "Environment variable {} not found (check your .env file)",
                        var_name
                    ))
                })?;
                result.replace_range(start..start + end + 1, &value);
                // substituted text is not scanned again
                cursor = start + value.len();
            } else {
                break;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.chain_id, BASE);
        assert_eq!(config.slippage_percent, 0.5);
        assert_eq!(config.deadline_secs, 1800);
        assert_eq!(config.gas_limit, 300_000);
    }

    #[test]
    fn test_rpc_overrides_and_env_substitution() {
        // SAFETY: test-local variable name, not read elsewhere
        unsafe { std::env::set_var("SWAPPER_TEST_RPC", "http://127.0.0.1:8545") };
        let config = Config::parse(
            r#"
chain_id = 1
slippage_percent = 1.0

[rpc_urls]
1 = "${SWAPPER_TEST_RPC}"
"#,
        )
        .unwrap();
        assert_eq!(config.chain_id, 1);
        let overrides = config.rpc_overrides().unwrap();
        assert_eq!(overrides.get(&1).unwrap(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_missing_env_var() {
        let err = Config::parse("log_level = \"${SWAPPER_TEST_UNSET_VAR}\"").unwrap_err();
        assert!(matches!(err, SwapError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse("slippage_percent = 100.0").is_err());
        assert!(Config::parse("deadline_secs = 0").is_err());
        assert!(Config::parse("gas_limit = 0").is_err());
        assert!(Config::parse("[rpc_urls]\nbase = \"http://x\"").is_err());
        assert!(matches!(
            Config::parse("log_level = \"loud\""),
            Err(SwapError::Config(_))
        ));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(Config::default().level().unwrap(), Level::INFO);
        let config = Config::parse("log_level = \"debug\"").unwrap();
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_env_value_is_not_expanded_again() {
        // SAFETY: test-local variable names, not read elsewhere
        unsafe {
            std::env::set_var("SWAPPER_TEST_SELF_REF", "${SWAPPER_TEST_SELF_REF}");
            std::env::set_var("SWAPPER_TEST_LEVEL", "warn");
        }
        let substituted = Config::substitute_env_vars(
            "a = \"${SWAPPER_TEST_SELF_REF}\"\nb = \"${SWAPPER_TEST_LEVEL}\"",
        )
        .unwrap();
        assert_eq!(substituted, "a = \"${SWAPPER_TEST_SELF_REF}\"\nb = \"warn\"");
    }
}
