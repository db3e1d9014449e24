//! Wallet storage configuration.

use std::path::PathBuf;

/// Where per-wallet files (such as the enabled-token list) live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory; each wallet gets a sub-directory named by its id.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Directory holding the files of one wallet.
    pub fn wallet_dir(&self, wallet_id: &str) -> PathBuf {
        self.data_dir.join(wallet_id)
    }
}
