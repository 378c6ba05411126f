//! Application configuration.
//!
//! Configuration is read from `config.json` in the platform config directory
//! (or an explicit path) and then overridden from the environment. It is never
//! written back: every session starts from the same inputs.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::amount::{TokenUnits, parse_amount};
use crate::types::{Balance, Network};

/// Environment variable overriding the RPC endpoint.
pub const ENDPOINT_ENV: &str = "TAOSTAKE_ENDPOINT";
/// Environment variable pre-seeding the validator hotkey.
pub const VALIDATOR_ADDRESS_ENV: &str = "TAOSTAKE_VALIDATOR_ADDRESS";

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Other configuration error.
    #[error("{0}")]
    Other(String),
}

/// A development or test key exposed through the keyring wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyringAccount {
    /// Optional label for the account.
    #[serde(default)]
    pub name: Option<String>,
    /// Provider name the account is listed under.
    #[serde(default = "default_source")]
    pub source: String,
    /// Secret URI (`//Alice`, a mnemonic, or a hex seed with derivation path).
    pub suri: String,
}

fn default_source() -> String {
    "keyring".to_string()
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network preset.
    #[serde(default)]
    pub network: Network,
    /// Custom RPC endpoint; overrides the preset.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Name presented to signing providers.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Hotkey pre-filled in the validator field.
    #[serde(default)]
    pub default_hotkey: Option<String>,
    /// Token symbol override.
    #[serde(default)]
    pub token_symbol: Option<String>,
    /// Token decimals override.
    #[serde(default)]
    pub token_decimals: Option<u8>,
    /// Smallest amount accepted for add/remove, in display units.
    #[serde(default = "default_min_stake")]
    pub min_stake: String,
    /// Upper bound on waiting for a submitted transaction to finalize.
    #[serde(default = "default_finalization_timeout_secs")]
    pub finalization_timeout_secs: u64,
    /// Keys exposed through the keyring wallet.
    #[serde(default)]
    pub accounts: Vec<KeyringAccount>,
}

fn default_app_name() -> String {
    "taostake".to_string()
}

fn default_min_stake() -> String {
    "1".to_string()
}

fn default_finalization_timeout_secs() -> u64 {
    300
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            endpoint: None,
            app_name: default_app_name(),
            default_hotkey: None,
            token_symbol: None,
            token_decimals: None,
            min_stake: default_min_stake(),
            finalization_timeout_secs: default_finalization_timeout_secs(),
            accounts: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = Some(endpoint);
        }
        if let Some(hotkey) = lookup(VALIDATOR_ADDRESS_ENV).filter(|v| !v.trim().is_empty()) {
            self.default_hotkey = Some(hotkey);
        }
    }

    /// Token denomination, network defaults unless overridden.
    pub fn units(&self) -> TokenUnits {
        TokenUnits::new(
            self.token_symbol
                .clone()
                .unwrap_or_else(|| self.network.token_symbol().to_string()),
            self.token_decimals
                .unwrap_or_else(|| self.network.token_decimals()),
        )
    }

    /// Minimum stake in base units.
    pub fn min_stake_base(&self) -> Result<Balance, ConfigError> {
        parse_amount(&self.min_stake, &self.units())
            .map_err(|e| ConfigError::Other(format!("Invalid min_stake '{}': {}", self.min_stake, e)))
    }

    pub fn finalization_timeout(&self) -> Duration {
        Duration::from_secs(self.finalization_timeout_secs)
    }

    /// Reject values the workflow cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_decimals.is_some_and(|d| d > 24) {
            return Err(ConfigError::Other(
                "token_decimals must be at most 24".to_string(),
            ));
        }
        if self.finalization_timeout_secs == 0 {
            return Err(ConfigError::Other(
                "finalization_timeout_secs must be positive".to_string(),
            ));
        }
        self.min_stake_base()?;
        Ok(())
    }
}

// ==================== Path Utilities ====================

/// Get the config directory.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("ai", "opentensor", "taostake")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))
}

/// Get the config file path.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

// ==================== Config I/O ====================

/// Load configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
