//! TOML file configuration structures.
//!
//! These structs directly map to the `purse.toml` file format. Every
//! section is optional and falls back to the defaults below.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub send: SendConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub wallets: Vec<WalletConfig>,
}

/// Send flow section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendConfig {
    /// Upper bound in seconds for each build/sign/broadcast/save step.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: default_step_timeout_secs(),
        }
    }
}

fn default_step_timeout_secs() -> u64 {
    60
}

/// Request screen section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Fiat units per whole crypto unit, as a decimal string.
    #[serde(default = "default_fiat_per_crypto")]
    pub fiat_per_crypto: Decimal,
    #[serde(default = "default_fiat_decimals")]
    pub fiat_decimals: u32,
    #[serde(default = "default_crypto_decimals")]
    pub crypto_decimals: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            fiat_per_crypto: default_fiat_per_crypto(),
            fiat_decimals: default_fiat_decimals(),
            crypto_decimals: default_crypto_decimals(),
        }
    }
}

fn default_fiat_per_crypto() -> Decimal {
    Decimal::new(177345, 5)
}

fn default_fiat_decimals() -> u32 {
    2
}

fn default_crypto_decimals() -> u32 {
    8
}

/// Storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the per-wallet folders.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./purse-data")
}

/// In-memory wallet seeded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet id; also names the wallet's storage folder.
    pub id: String,
    #[serde(default = "default_wallet_name")]
    pub name: String,
    #[serde(default = "default_currency_code")]
    pub currency_code: String,
    /// Smallest units per whole unit.
    #[serde(default = "default_multiplier")]
    pub multiplier: String,
    #[serde(default = "default_uri_scheme")]
    pub uri_scheme: String,
    /// Starting balance in smallest units.
    #[serde(default)]
    pub balance: u64,
    /// Flat fee in smallest units at standard priority.
    #[serde(default = "default_network_fee")]
    pub network_fee: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_address: Option<String>,
    /// Absent for receive-only wallets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_seed: Option<String>,
}

fn default_wallet_name() -> String {
    "My Wallet".to_string()
}

fn default_currency_code() -> String {
    "BTC".to_string()
}

fn default_multiplier() -> String {
    "100000000".to_string()
}

fn default_uri_scheme() -> String {
    "bitcoin".to_string()
}

fn default_network_fee() -> u64 {
    1_000
}
