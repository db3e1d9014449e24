//! Configuration module for the purse CLI.
//!
//! Handles loading configuration from TOML files and CLI arguments and
//! turning it into the runtime types of `purse_sdk::config`.

pub mod file;

use crate::config::file::{FileConfig, WalletConfig};
use purse_sdk::config::{RequestConfig, SendConfig, SharedConfig, StorageConfig};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub send: SendConfig,
    pub request: RequestConfig,
    pub storage: StorageConfig,
    pub wallets: Vec<WalletConfig>,
}

impl LoadedConfig {
    /// Split off the shared runtime sections; wallets are returned as-is.
    pub fn into_shared(self) -> (SharedConfig, Vec<WalletConfig>) {
        (
            SharedConfig::new(self.send, self.request, self.storage),
            self.wallets,
        )
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    step_timeout_override: Option<u64>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, step_timeout_override: Option<u64>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            step_timeout_override,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(secs) = self.step_timeout_override {
            file_config.send.step_timeout_secs = secs;
        }

        validate(&file_config)?;
        Ok(build_loaded_config(file_config))
    }

    /// Write a starter config with one funded wallet, unless a file exists.
    ///
    /// Returns `false` when the file was already there.
    pub fn write_default(&self) -> Result<bool, ConfigError> {
        if self.config_path.exists() {
            return Ok(false);
        }
        let config = FileConfig {
            wallets: vec![WalletConfig {
                id: "btc-main".to_string(),
                name: "My Bitcoin".to_string(),
                currency_code: "BTC".to_string(),
                multiplier: "100000000".to_string(),
                uri_scheme: "bitcoin".to_string(),
                balance: 100_000_000,
                network_fee: 1_000,
                receive_address: None,
                private_seed: None,
            }],
            ..FileConfig::default()
        };
        let toml_string = toml::to_string_pretty(&config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;
        Ok(true)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.send.step_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "send.step_timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.request.fiat_per_crypto <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "request.fiat_per_crypto must be greater than zero".to_string(),
        ));
    }
    if config.wallets.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one [[wallets]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for wallet in &config.wallets {
        if wallet.id.is_empty() || wallet.id.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "wallet id {:?} is not a valid folder name",
                wallet.id
            )));
        }
        if !seen.insert(wallet.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "wallet {} is defined twice",
                wallet.id
            )));
        }
        match wallet.multiplier.parse::<Decimal>() {
            Ok(multiplier) if multiplier > Decimal::ZERO => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "wallet {} has an invalid multiplier {:?}",
                    wallet.id, wallet.multiplier
                )));
            }
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        send: SendConfig::new(Duration::from_secs(file_config.send.step_timeout_secs)),
        request: RequestConfig::new(
            file_config.request.fiat_per_crypto,
            file_config.request.fiat_decimals,
            file_config.request.crypto_decimals,
        ),
        storage: StorageConfig {
            data_dir: file_config.storage.data_dir,
        },
        wallets: file_config.wallets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("purse-{}-{name}.toml", std::process::id()))
    }

    fn loader_for(name: &str, contents: &str) -> ConfigLoader {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        ConfigLoader::new(path, None)
    }

    #[test]
    fn test_load_applies_timeout_override() {
        let path = temp_path("override");
        std::fs::write(&path, "[[wallets]]\nid = \"btc-main\"\n").unwrap();

        let loaded = ConfigLoader::new(&path, Some(5)).load().unwrap();
        assert_eq!(loaded.send.step_timeout, Duration::from_secs(5));
        assert_eq!(loaded.wallets[0].id, "btc-main");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_duplicate_wallet_ids_are_rejected() {
        let loader = loader_for(
            "duplicate",
            "[[wallets]]\nid = \"a\"\n\n[[wallets]]\nid = \"a\"\n",
        );
        assert!(matches!(
            loader.load(),
            Err(ConfigError::ValidationError(message)) if message.contains("defined twice")
        ));
        std::fs::remove_file(loader.config_path()).unwrap();
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let loader = loader_for(
            "zero-rate",
            "[request]\nfiat_per_crypto = \"0\"\n\n[[wallets]]\nid = \"a\"\n",
        );
        assert!(matches!(loader.load(), Err(ConfigError::ValidationError(_))));
        std::fs::remove_file(loader.config_path()).unwrap();
    }

    #[test]
    fn test_write_default_round_trips() {
        let path = temp_path("default");
        let _ = std::fs::remove_file(&path);
        let loader = ConfigLoader::new(&path, None);

        assert!(loader.write_default().unwrap());
        assert!(!loader.write_default().unwrap());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.wallets.len(), 1);
        assert_eq!(loaded.wallets[0].balance, 100_000_000);
        assert_eq!(loaded.request.fiat_per_crypto, Decimal::new(177345, 5));
        std::fs::remove_file(path).unwrap();
    }
}
