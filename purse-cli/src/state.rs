//! Application state shared across all commands.

use crate::config::file::WalletConfig;
use purse_core::engine::MemoryWallet;
use purse_core::storage::FsFolder;
use purse_core::wallet::{WalletGateway, WalletLookupError, WalletRegistry};
use purse_sdk::config::SharedConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Application state shared across all commands.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: SharedConfig,
    /// Seeded wallets and the current selection.
    pub wallets: WalletRegistry,
    /// Static wallet settings by id, for display-unit conversion.
    settings: Arc<HashMap<String, WalletConfig>>,
}

impl AppState {
    /// Seed one in-memory wallet per config entry, each with its own
    /// storage folder under the data directory.
    pub async fn new(config: SharedConfig, wallet_configs: Vec<WalletConfig>) -> Self {
        let wallets = WalletRegistry::new();
        let storage = config.storage().await.clone();

        for wallet in &wallet_configs {
            let folder = FsFolder::new(storage.wallet_dir(&wallet.id));
            let mut builder = MemoryWallet::builder(&wallet.id)
                .name(&wallet.name)
                .currency(
                    wallet.currency_code.as_str(),
                    &wallet.multiplier,
                    &wallet.uri_scheme,
                )
                .balance(wallet.balance.into())
                .network_fee(wallet.network_fee.into())
                .private_seed(wallet.private_seed.clone())
                .folder(Arc::new(folder));
            if let Some(address) = &wallet.receive_address {
                builder = builder.receive_address(address);
            }
            wallets
                .insert(WalletGateway::new(Arc::new(builder.build())))
                .await;
        }

        let settings = wallet_configs
            .into_iter()
            .map(|wallet| (wallet.id.clone(), wallet))
            .collect();

        Self {
            config,
            wallets,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self, wallet_id: &str) -> Option<&WalletConfig> {
        self.settings.get(wallet_id)
    }

    /// Selected wallet's gateway together with its settings.
    pub async fn selected(&self) -> Result<(WalletGateway, &WalletConfig), WalletLookupError> {
        let gateway = self.wallets.selected().await?;
        let settings = self
            .settings
            .get(gateway.wallet_id())
            .ok_or_else(|| WalletLookupError::Unknown(gateway.wallet_id().to_string()))?;
        Ok((gateway, settings))
    }
}
