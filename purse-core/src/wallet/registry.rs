//! Wallet registry: the wallets this process knows about and which one the
//! send and request flows currently operate on.

use crate::wallet::WalletGateway;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletLookupError {
    /// No wallet has been selected yet
    #[error("no wallet selected")]
    NoneSelected,

    /// The id is not registered
    #[error("unknown wallet: {0}")]
    Unknown(String),
}

/// Shared registry of wallet gateways keyed by wallet id.
#[derive(Clone, Default)]
pub struct WalletRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    wallets: RwLock<BTreeMap<String, WalletGateway>>,
    selected: RwLock<Option<String>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a wallet. The first wallet registered becomes the selection.
    pub async fn insert(&self, gateway: WalletGateway) {
        let id = gateway.wallet_id().to_string();
        self.inner.wallets.write().await.insert(id.clone(), gateway);
        let mut selected = self.inner.selected.write().await;
        if selected.is_none() {
            info!(wallet_id = %id, "Selected wallet");
            *selected = Some(id);
        }
    }

    pub async fn get(&self, wallet_id: &str) -> Result<WalletGateway, WalletLookupError> {
        self.inner
            .wallets
            .read()
            .await
            .get(wallet_id)
            .cloned()
            .ok_or_else(|| WalletLookupError::Unknown(wallet_id.to_string()))
    }

    pub async fn select(&self, wallet_id: &str) -> Result<(), WalletLookupError> {
        if !self.inner.wallets.read().await.contains_key(wallet_id) {
            return Err(WalletLookupError::Unknown(wallet_id.to_string()));
        }
        *self.inner.selected.write().await = Some(wallet_id.to_string());
        info!(wallet_id, "Selected wallet");
        Ok(())
    }

    pub async fn selected_id(&self) -> Option<String> {
        self.inner.selected.read().await.clone()
    }

    /// Gateway of the selected wallet.
    pub async fn selected(&self) -> Result<WalletGateway, WalletLookupError> {
        let id = self
            .selected_id()
            .await
            .ok_or(WalletLookupError::NoneSelected)?;
        self.get(&id).await
    }

    pub async fn ids(&self) -> Vec<String> {
        self.inner.wallets.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryWallet;

    fn gateway(id: &str) -> WalletGateway {
        WalletGateway::new(Arc::new(MemoryWallet::builder(id).build()))
    }

    #[tokio::test]
    async fn test_empty_registry_has_no_selection() {
        let registry = WalletRegistry::new();
        assert_eq!(
            registry.selected().await.err(),
            Some(WalletLookupError::NoneSelected)
        );
    }

    #[tokio::test]
    async fn test_first_wallet_is_selected() {
        let registry = WalletRegistry::new();
        registry.insert(gateway("btc-main")).await;
        registry.insert(gateway("eth-main")).await;

        let selected = registry.selected().await.unwrap();
        assert_eq!(selected.wallet_id(), "btc-main");
        assert_eq!(registry.ids().await, ["btc-main", "eth-main"]);
    }

    #[tokio::test]
    async fn test_select_switches_and_rejects_unknown() {
        let registry = WalletRegistry::new();
        registry.insert(gateway("btc-main")).await;
        registry.insert(gateway("eth-main")).await;

        registry.select("eth-main").await.unwrap();
        assert_eq!(registry.selected().await.unwrap().wallet_id(), "eth-main");

        assert_eq!(
            registry.select("ltc-main").await,
            Err(WalletLookupError::Unknown("ltc-main".to_string()))
        );
        assert_eq!(registry.selected_id().await.as_deref(), Some("eth-main"));
    }
}
