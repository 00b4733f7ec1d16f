//! Configuration management for hashledger

use crate::error::{ChainError, Result};
use crate::miner::MiningConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "hashledger.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    #[serde(default = "default_genesis_data")]
    pub genesis_data: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            genesis_data: default_genesis_data(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    /// 0 means unlimited.
    #[serde(default)]
    pub max_attempts: u64,
    /// Human readable duration such as "30s" or "2m".
    #[serde(default)]
    pub timeout: Option<String>,
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            timeout: None,
            check_interval: default_check_interval(),
        }
    }
}

impl MinerConfig {
    fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw)
                    .map_err(|e| ChainError::ConfigError(format!("miner.timeout '{}': {}", raw, e)))
            })
            .transpose()
    }

    pub fn to_mining_config(&self) -> Result<MiningConfig> {
        Ok(MiningConfig {
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            timeout: self.timeout()?,
            check_interval: self.check_interval,
        })
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.difficulty > crate::blockchain::MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(self.chain.difficulty));
        }
        if self.chain.genesis_data.is_empty() {
            return Err(ChainError::ConfigError("chain.genesis_data must not be empty".to_string()));
        }
        if self.miner.check_interval == 0 {
            return Err(ChainError::ConfigError("miner.check_interval must be greater than zero".to_string()));
        }
        self.miner.timeout()?;
        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = fs::read_to_string(path)?;
    Config::from_toml_str(&raw)
}

fn default_difficulty() -> usize {
    crate::blockchain::DEFAULT_DIFFICULTY
}

fn default_genesis_data() -> String {
    crate::blockchain::GENESIS_DATA.to_string()
}

fn default_check_interval() -> u64 {
    10_000
}
