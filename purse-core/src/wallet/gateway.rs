//! WalletGateway: capability-narrowing facade over the wallet engine.
//!
//! Every operation resolves to a neutral default when the engine does not
//! implement the capability, so the rest of the core runs unchanged
//! against engines with partial capability sets.

use crate::engine::{EngineError, WalletHandle};
use crate::storage::WalletFolder;
use purse_sdk::objects::{
    Metadata, PaymentProtocolInfo, ProtocolInfoResolution, ReceiveAddress, SpendRequest,
    TokenInfo, Transaction, TransactionQuery, UriParseResult,
};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

/// Shown instead of a seed for wallets that cannot spend.
pub const RECEIVE_ONLY_SEED: &str = "receive-only wallet";

/// Cheap, cloneable handle over one engine wallet.
#[derive(Clone)]
pub struct WalletGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    wallet: WalletHandle,
    /// Last payment-protocol descriptor that resolved successfully.
    last_known_protocol_info: RwLock<Option<PaymentProtocolInfo>>,
    /// Serializes enabled-token updates for this wallet.
    token_lock: Mutex<()>,
}

impl WalletGateway {
    pub fn new(wallet: WalletHandle) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                wallet,
                last_known_protocol_info: RwLock::new(None),
                token_lock: Mutex::new(()),
            }),
        }
    }

    pub fn wallet_id(&self) -> &str {
        self.inner.wallet.id()
    }

    pub fn folder(&self) -> Arc<dyn WalletFolder> {
        self.inner.wallet.folder()
    }

    pub(crate) async fn lock_tokens(&self) -> MutexGuard<'_, ()> {
        self.inner.token_lock.lock().await
    }

    /// Map an unsupported capability to `default`, pass everything else on.
    fn degrade<T>(
        &self,
        result: Result<T, EngineError>,
        default: impl FnOnce() -> T,
    ) -> Result<T, EngineError> {
        match result {
            Err(EngineError::Unsupported(capability)) => {
                debug!(
                    wallet_id = %self.wallet_id(),
                    capability,
                    "Capability not supported, using neutral default"
                );
                Ok(default())
            }
            other => other,
        }
    }

    pub async fn rename_wallet(&self, name: &str) -> Result<(), EngineError> {
        self.inner.wallet.rename_wallet(name).await?;
        info!(wallet_id = %self.wallet_id(), name, "Wallet renamed");
        Ok(())
    }

    pub async fn get_num_transactions(&self, currency_code: &str) -> Result<u64, EngineError> {
        let result = self.inner.wallet.get_num_transactions(currency_code).await;
        self.degrade(result, || 0)
    }

    pub async fn get_transactions(
        &self,
        currency_code: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, EngineError> {
        let result = self.inner.wallet.get_transactions(currency_code, query).await;
        self.degrade(result, Vec::new)
    }

    pub async fn save_tx_metadata(
        &self,
        txid: &str,
        currency_code: &str,
        metadata: &Metadata,
    ) -> Result<(), EngineError> {
        let result = self
            .inner
            .wallet
            .save_tx_metadata(txid, currency_code, metadata)
            .await;
        self.degrade(result, || ())
    }

    pub async fn get_receive_address(
        &self,
        currency_code: &str,
    ) -> Result<ReceiveAddress, EngineError> {
        let result = self.inner.wallet.get_receive_address(currency_code).await;
        self.degrade(result, ReceiveAddress::placeholder)
    }

    /// Resolve a payment-protocol URI.
    ///
    /// Never fails: on error the last descriptor that resolved on this
    /// wallet is returned marked as stale, or `Unavailable` if there is none.
    pub async fn get_payment_protocol_info(&self, uri: &str) -> ProtocolInfoResolution {
        match self.inner.wallet.get_payment_protocol_info(uri).await {
            Ok(info) => {
                *self.inner.last_known_protocol_info.write().await = Some(info.clone());
                ProtocolInfoResolution::Fresh(info)
            }
            Err(e) => {
                warn!(
                    wallet_id = %self.wallet_id(),
                    uri,
                    error = %e,
                    "Failed to resolve payment protocol URI"
                );
                let reason = e.to_string();
                match self.inner.last_known_protocol_info.read().await.clone() {
                    Some(info) => ProtocolInfoResolution::Stale { info, reason },
                    None => ProtocolInfoResolution::Unavailable { reason },
                }
            }
        }
    }

    pub async fn make_spend(&self, request: &SpendRequest) -> Result<Transaction, EngineError> {
        let result = self.inner.wallet.make_spend(request).await;
        self.degrade(result, Transaction::placeholder)
    }

    pub async fn get_max_spendable(&self, request: &SpendRequest) -> Result<String, EngineError> {
        let result = self.inner.wallet.get_max_spendable(request).await;
        self.degrade(result, || "0".to_string())
    }

    pub async fn get_balance(&self, currency_code: &str) -> Result<String, EngineError> {
        let result = self.inner.wallet.get_balance(currency_code).await;
        self.degrade(result, || "0".to_string())
    }

    pub async fn enable_tokens(&self, tokens: &[String]) -> Result<(), EngineError> {
        self.inner.wallet.enable_tokens(tokens).await
    }

    pub async fn disable_tokens(&self, tokens: &[String]) -> Result<(), EngineError> {
        self.inner.wallet.disable_tokens(tokens).await
    }

    /// Register a custom token and enable it on the engine.
    pub async fn add_custom_token(&self, token: &TokenInfo) -> Result<(), EngineError> {
        let result = async {
            self.inner.wallet.add_custom_token(token).await?;
            self.inner
                .wallet
                .enable_tokens(&[token.currency_code.to_string()])
                .await
        }
        .await;
        if let Err(e) = &result {
            warn!(
                wallet_id = %self.wallet_id(),
                currency_code = %token.currency_code,
                error = %e,
                "Failed to add custom token"
            );
        }
        result
    }

    pub fn parse_uri(&self, uri: &str) -> Result<UriParseResult, EngineError> {
        self.inner.wallet.parse_uri(uri)
    }

    pub async fn sign_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError> {
        self.inner.wallet.sign_tx(transaction).await
    }

    pub async fn broadcast_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError> {
        self.inner.wallet.broadcast_tx(transaction).await
    }

    pub async fn save_tx(&self, transaction: &Transaction) -> Result<(), EngineError> {
        self.inner.wallet.save_tx(transaction).await
    }

    pub async fn resync(&self) -> Result<(), EngineError> {
        self.inner.wallet.resync_blockchain().await
    }

    /// Seed for display, or [`RECEIVE_ONLY_SEED`] when the wallet has none.
    pub async fn get_display_private_seed(&self) -> Result<String, EngineError> {
        let seed = self.inner.wallet.get_display_private_seed().await?;
        Ok(seed
            .filter(|seed| !seed.is_empty())
            .unwrap_or_else(|| RECEIVE_ONLY_SEED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::{EngineCall, Fault};
    use crate::engine::{CurrencyWallet, MemoryWallet};
    use crate::storage::MemoryFolder;
    use async_trait::async_trait;

    /// Engine implementing only the capabilities every wallet must have.
    struct BareWallet {
        folder: Arc<MemoryFolder>,
    }

    #[async_trait]
    impl CurrencyWallet for BareWallet {
        fn id(&self) -> &str {
            "bare"
        }

        fn folder(&self) -> Arc<dyn WalletFolder> {
            self.folder.clone()
        }

        async fn rename_wallet(&self, _name: &str) -> Result<(), EngineError> {
            Ok(())
        }

        async fn get_payment_protocol_info(
            &self,
            _uri: &str,
        ) -> Result<PaymentProtocolInfo, EngineError> {
            Err(EngineError::Network("offline".to_string()))
        }

        async fn enable_tokens(&self, _tokens: &[String]) -> Result<(), EngineError> {
            Ok(())
        }

        async fn disable_tokens(&self, _tokens: &[String]) -> Result<(), EngineError> {
            Ok(())
        }

        async fn add_custom_token(&self, _token: &TokenInfo) -> Result<(), EngineError> {
            Ok(())
        }

        fn parse_uri(&self, uri: &str) -> Result<UriParseResult, EngineError> {
            Err(EngineError::InvalidUri(uri.to_string()))
        }

        async fn sign_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError> {
            Ok(transaction)
        }

        async fn broadcast_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError> {
            Ok(transaction)
        }

        async fn save_tx(&self, _transaction: &Transaction) -> Result<(), EngineError> {
            Ok(())
        }

        async fn resync_blockchain(&self) -> Result<(), EngineError> {
            Ok(())
        }

        async fn get_display_private_seed(&self) -> Result<Option<String>, EngineError> {
            Ok(None)
        }
    }

    fn bare_gateway() -> WalletGateway {
        WalletGateway::new(Arc::new(BareWallet {
            folder: Arc::new(MemoryFolder::new()),
        }))
    }

    fn invoice() -> PaymentProtocolInfo {
        PaymentProtocolInfo {
            domain: "merchant.example".to_string(),
            native_amount: "11000000".to_string(),
            memo: None,
            merchant: Some("Sprouts".to_string()),
            spend_targets: vec![],
        }
    }

    #[tokio::test]
    async fn test_unsupported_capabilities_degrade_to_defaults() {
        let gateway = bare_gateway();
        let request = SpendRequest::default();

        assert_eq!(gateway.get_balance("BTC").await.unwrap(), "0");
        assert_eq!(gateway.get_max_spendable(&request).await.unwrap(), "0");
        assert_eq!(gateway.get_num_transactions("BTC").await.unwrap(), 0);
        assert!(
            gateway
                .get_transactions("BTC", &TransactionQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(
            gateway
                .save_tx_metadata("txid", "BTC", &Metadata::default())
                .await
                .is_ok()
        );
        assert_eq!(
            gateway.make_spend(&request).await.unwrap(),
            Transaction::placeholder()
        );
        assert_eq!(
            gateway.get_receive_address("BTC").await.unwrap(),
            ReceiveAddress::placeholder()
        );
    }

    #[tokio::test]
    async fn test_receive_only_wallet_seed() {
        assert_eq!(
            bare_gateway().get_display_private_seed().await.unwrap(),
            RECEIVE_ONLY_SEED
        );
    }

    #[tokio::test]
    async fn test_protocol_failure_without_history_is_unavailable() {
        let resolution = bare_gateway().get_payment_protocol_info("https://x/pay").await;
        assert!(matches!(
            resolution,
            ProtocolInfoResolution::Unavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_protocol_failure_falls_back_to_last_known_good() {
        let wallet = Arc::new(MemoryWallet::builder("w").build());
        wallet.register_invoice("https://merchant/pay/1", invoice()).await;
        let gateway = WalletGateway::new(wallet.clone());

        let first = gateway.get_payment_protocol_info("https://merchant/pay/1").await;
        assert_eq!(first, ProtocolInfoResolution::Fresh(invoice()));

        wallet
            .inject_fault(EngineCall::PaymentProtocol, Fault::Reject("timeout".to_string()))
            .await;
        let second = gateway.get_payment_protocol_info("https://merchant/pay/1").await;
        match second {
            ProtocolInfoResolution::Stale { info, reason } => {
                assert_eq!(info, invoice());
                assert_eq!(reason, "timeout");
            }
            other => panic!("expected stale fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_engine_errors_are_not_masked() {
        let wallet = Arc::new(MemoryWallet::builder("w").build());
        wallet
            .inject_fault(EngineCall::MakeSpend, Fault::Reject("bad address".to_string()))
            .await;
        let gateway = WalletGateway::new(wallet);
        assert_eq!(
            gateway.make_spend(&SpendRequest::default()).await,
            Err(EngineError::Rejected("bad address".to_string()))
        );
    }
}
