//! TokenEnablementStore: the persisted set of enabled tokens per wallet.
//!
//! The enabled set lives in the wallet folder as a JSON array. Every update
//! goes through one routine with a fixed order: persist the desired set,
//! then enable on the engine, then disable on the engine. Engine steps are
//! retried once each and their failures are logged, so after a partial
//! failure the persisted file always holds the intended set and the engine
//! catches up on the next update. All updates for one wallet are serialized
//! through the gateway's token lock.

use crate::engine::EngineError;
use crate::storage::StorageError;
use crate::wallet::WalletGateway;
use kanau::processor::Processor;
use purse_sdk::objects::{EnabledTokenSet, TokenInfo};
use std::convert::Infallible;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// File in the wallet folder holding the enabled-token list.
pub const ENABLED_TOKENS_FILENAME: &str = "EnabledTokens.json";

/// Errors that can occur while reading or writing the enabled-token file.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The file exists but does not hold a JSON list of strings
    #[error("enabled token file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Engine rejected the custom token
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Persisted enabled-token set of one wallet.
#[derive(Clone)]
pub struct TokenEnablementStore {
    gateway: WalletGateway,
}

impl TokenEnablementStore {
    pub fn new(gateway: WalletGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &WalletGateway {
        &self.gateway
    }

    /// Load the enabled set, self-healing a missing or corrupt file to `[]`.
    ///
    /// A folder that cannot be read yields `[]` and the file is left alone.
    pub async fn read(&self) -> EnabledTokenSet {
        let _guard = self.gateway.lock_tokens().await;
        self.read_unlocked().await.unwrap_or_else(|e| {
            error!(
                wallet_id = %self.gateway.wallet_id(),
                error = %e,
                "Failed to read enabled tokens"
            );
            EnabledTokenSet::default()
        })
    }

    /// Persist `tokens` as the enabled set, enable them on the engine and
    /// disable `tokens_to_disable`. Order is kept; repeated codes collapse
    /// to their first occurrence.
    pub async fn write(
        &self,
        tokens: EnabledTokenSet,
        tokens_to_disable: Option<EnabledTokenSet>,
    ) -> Result<EnabledTokenSet, TokenStoreError> {
        let _guard = self.gateway.lock_tokens().await;
        let to_disable = tokens_to_disable.unwrap_or_default();
        self.apply(&tokens, &to_disable).await?;
        Ok(tokens)
    }

    /// `(persisted ∪ to_enable) − to_disable`, persisted and applied.
    ///
    /// Failures are logged and swallowed; use
    /// [`try_reconcile`](Self::try_reconcile) to observe them.
    pub async fn reconcile(&self, to_enable: &EnabledTokenSet, to_disable: &EnabledTokenSet) {
        if let Err(e) = self.try_reconcile(to_enable, to_disable).await {
            error!(
                wallet_id = %self.gateway.wallet_id(),
                error = %e,
                "Failed to reconcile enabled tokens"
            );
        }
    }

    pub async fn try_reconcile(
        &self,
        to_enable: &EnabledTokenSet,
        to_disable: &EnabledTokenSet,
    ) -> Result<EnabledTokenSet, TokenStoreError> {
        let _guard = self.gateway.lock_tokens().await;
        let persisted = self.read_unlocked().await?;
        let final_enabled = persisted.union(to_enable).difference(to_disable);
        debug!(
            wallet_id = %self.gateway.wallet_id(),
            persisted = ?persisted.as_slice(),
            final_enabled = ?final_enabled.as_slice(),
            "Reconciling enabled tokens"
        );
        self.apply(&final_enabled, to_disable).await?;
        Ok(final_enabled)
    }

    /// Register a custom token on the engine and add it to the enabled set.
    pub async fn add_custom_token(
        &self,
        token: &TokenInfo,
    ) -> Result<EnabledTokenSet, TokenStoreError> {
        self.gateway.add_custom_token(token).await?;
        let added = EnabledTokenSet::new([token.currency_code.to_string()]);
        self.try_reconcile(&added, &EnabledTokenSet::default()).await
    }

    async fn read_unlocked(&self) -> Result<EnabledTokenSet, TokenStoreError> {
        match self.load().await {
            Ok(tokens) => Ok(tokens),
            Err(
                e @ (TokenStoreError::Corrupt(_)
                | TokenStoreError::Storage(StorageError::NotFound(_))),
            ) => {
                warn!(
                    wallet_id = %self.gateway.wallet_id(),
                    error = %e,
                    "Enabled token file unreadable, resetting to empty"
                );
                let empty = EnabledTokenSet::default();
                if let Err(e) = self.apply(&empty, &EnabledTokenSet::default()).await {
                    error!(
                        wallet_id = %self.gateway.wallet_id(),
                        error = %e,
                        "Failed to rewrite enabled token file"
                    );
                }
                Ok(empty)
            }
            Err(e) => Err(e),
        }
    }

    async fn load(&self) -> Result<EnabledTokenSet, TokenStoreError> {
        let text = self
            .gateway
            .folder()
            .get_text(ENABLED_TOKENS_FILENAME)
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn persist(&self, tokens: &EnabledTokenSet) -> Result<(), TokenStoreError> {
        let text = serde_json::to_string(tokens)?;
        self.gateway
            .folder()
            .set_text(ENABLED_TOKENS_FILENAME, &text)
            .await?;
        Ok(())
    }

    /// Persist first, then bring the engine in line.
    async fn apply(
        &self,
        enabled: &EnabledTokenSet,
        to_disable: &EnabledTokenSet,
    ) -> Result<(), TokenStoreError> {
        self.persist(enabled).await?;

        let gateway = &self.gateway;
        let enable = enabled.as_slice();
        let disable = to_disable.as_slice();
        let mut engine_synced = true;
        if !enable.is_empty() {
            engine_synced &= self
                .retry_once("enable", move || gateway.enable_tokens(enable))
                .await;
        }
        if !disable.is_empty() {
            engine_synced &= self
                .retry_once("disable", move || gateway.disable_tokens(disable))
                .await;
        }

        if engine_synced {
            info!(
                wallet_id = %self.gateway.wallet_id(),
                enabled = enabled.len(),
                disabled = to_disable.len(),
                "Enabled tokens updated"
            );
        }
        Ok(())
    }

    async fn retry_once<F, Fut>(&self, action: &'static str, mut op: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), EngineError>>,
    {
        for attempt in 1..=2u8 {
            match op().await {
                Ok(()) => return true,
                Err(e) => warn!(
                    wallet_id = %self.gateway.wallet_id(),
                    action,
                    attempt,
                    error = %e,
                    "Engine token update failed"
                ),
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
/// Read the persisted enabled-token set.
pub struct ReadEnabledTokens;

#[derive(Debug, Clone)]
/// Replace the enabled-token set.
pub struct WriteEnabledTokens {
    pub tokens: EnabledTokenSet,
    pub tokens_to_disable: Option<EnabledTokenSet>,
}

#[derive(Debug, Clone)]
/// Merge enable/disable requests into the persisted set.
pub struct ReconcileEnabledTokens {
    pub to_enable: EnabledTokenSet,
    pub to_disable: EnabledTokenSet,
}

impl Processor<ReadEnabledTokens> for TokenEnablementStore {
    type Output = EnabledTokenSet;
    type Error = Infallible;

    async fn process(&self, _query: ReadEnabledTokens) -> Result<EnabledTokenSet, Infallible> {
        Ok(self.read().await)
    }
}

impl Processor<WriteEnabledTokens> for TokenEnablementStore {
    type Output = EnabledTokenSet;
    type Error = TokenStoreError;

    #[tracing::instrument(skip_all, err, name = "Tokens:Write")]
    async fn process(
        &self,
        command: WriteEnabledTokens,
    ) -> Result<EnabledTokenSet, TokenStoreError> {
        self.write(command.tokens, command.tokens_to_disable).await
    }
}

impl Processor<ReconcileEnabledTokens> for TokenEnablementStore {
    type Output = ();
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Tokens:Reconcile")]
    async fn process(&self, command: ReconcileEnabledTokens) -> Result<(), Infallible> {
        self.reconcile(&command.to_enable, &command.to_disable).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryWallet;
    use crate::engine::memory::{EngineCall, Fault, TokenCall};
    use crate::storage::{MemoryFolder, WalletFolder};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn store() -> (Arc<MemoryWallet>, TokenEnablementStore) {
        let wallet = Arc::new(MemoryWallet::builder("wallet-1").build());
        let store = TokenEnablementStore::new(WalletGateway::new(wallet.clone()));
        (wallet, store)
    }

    fn set(tokens: &[&str]) -> EnabledTokenSet {
        EnabledTokenSet::new(tokens.iter().copied())
    }

    async fn file_contents(store: &TokenEnablementStore) -> String {
        store
            .gateway()
            .folder()
            .get_text(ENABLED_TOKENS_FILENAME)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_, store) = store();
        let written = store.write(set(&["BTC", "ETH"]), None).await.unwrap();
        assert_eq!(written, set(&["BTC", "ETH"]));
        assert_eq!(store.read().await.as_slice(), ["BTC", "ETH"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_self_heals_to_empty() {
        let (_, store) = store();
        store
            .gateway()
            .folder()
            .set_text(ENABLED_TOKENS_FILENAME, "{not json")
            .await
            .unwrap();

        assert!(store.read().await.is_empty());
        assert_eq!(file_contents(&store).await, "[]");
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let (wallet, store) = store();
        assert!(store.read().await.is_empty());
        assert_eq!(file_contents(&store).await, "[]");
        assert!(wallet.token_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_merges_and_applies() {
        let (wallet, store) = store();
        store.write(set(&["A", "B"]), None).await.unwrap();

        store.reconcile(&set(&["C"]), &set(&["B"])).await;

        assert_eq!(store.read().await.as_slice(), ["A", "C"]);
        let calls = wallet.token_calls().await;
        assert_eq!(
            &calls[calls.len() - 2..],
            [
                TokenCall::Enable(vec!["A".to_string(), "C".to_string()]),
                TokenCall::Disable(vec!["B".to_string()]),
            ]
        );
        assert_eq!(wallet.enabled_tokens().await, ["A", "C"]);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (_, store) = store();
        store.write(set(&["A", "B"]), None).await.unwrap();

        let first = store.try_reconcile(&set(&["C"]), &set(&["B"])).await.unwrap();
        let second = store.try_reconcile(&set(&["C"]), &set(&["B"])).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(file_contents(&store).await, r#"["A","C"]"#);
    }

    #[tokio::test]
    async fn test_engine_failure_keeps_persisted_target() {
        let (wallet, store) = store();
        wallet
            .inject_fault(EngineCall::EnableTokens, Fault::Reject("engine busy".to_string()))
            .await;

        let written = store.write(set(&["REP"]), None).await.unwrap();
        assert_eq!(written, set(&["REP"]));
        assert_eq!(file_contents(&store).await, r#"["REP"]"#);

        // One retry, then the failure is swallowed.
        let enables = wallet
            .token_calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, TokenCall::Enable(_)))
            .count();
        assert_eq!(enables, 2);
        assert!(wallet.enabled_tokens().await.is_empty());

        wallet.clear_fault(EngineCall::EnableTokens).await;
        store.reconcile(&set(&[]), &set(&[])).await;
        assert_eq!(wallet.enabled_tokens().await, ["REP"]);
    }

    #[tokio::test]
    async fn test_disable_failure_keeps_persisted_target() {
        let (wallet, store) = store();
        store.write(set(&["A", "B"]), None).await.unwrap();
        wallet
            .inject_fault(EngineCall::DisableTokens, Fault::Reject("engine busy".to_string()))
            .await;

        let enabled = store.try_reconcile(&set(&[]), &set(&["B"])).await.unwrap();
        assert_eq!(enabled, set(&["A"]));
        assert_eq!(file_contents(&store).await, r#"["A"]"#);

        let disables = wallet
            .token_calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, TokenCall::Disable(_)))
            .count();
        assert_eq!(disables, 2);
        assert_eq!(wallet.enabled_tokens().await, ["A", "B"]);

        wallet.clear_fault(EngineCall::DisableTokens).await;
        store.reconcile(&set(&[]), &set(&["B"])).await;
        assert_eq!(wallet.enabled_tokens().await, ["A"]);
    }

    /// Folder whose reads fail with an IO error while `failing` is set.
    #[derive(Default)]
    struct FlakyFolder {
        files: MemoryFolder,
        failing: AtomicBool,
    }

    #[async_trait]
    impl WalletFolder for FlakyFolder {
        async fn get_text(&self, name: &str) -> Result<String, StorageError> {
            if self.failing.load(Ordering::Acquire) {
                return Err(StorageError::Io(std::io::Error::other("device busy")));
            }
            self.files.get_text(name).await
        }

        async fn set_text(&self, name: &str, text: &str) -> Result<(), StorageError> {
            self.files.set_text(name, text).await
        }
    }

    #[tokio::test]
    async fn test_io_error_does_not_reset_persisted_set() {
        let folder = Arc::new(FlakyFolder::default());
        let wallet = Arc::new(
            MemoryWallet::builder("wallet-1")
                .folder(folder.clone())
                .build(),
        );
        let store = TokenEnablementStore::new(WalletGateway::new(wallet));
        store.write(set(&["A", "B"]), None).await.unwrap();

        folder.failing.store(true, Ordering::Release);
        let result = store.try_reconcile(&set(&["C"]), &set(&[])).await;
        assert!(matches!(
            result,
            Err(TokenStoreError::Storage(StorageError::Io(_)))
        ));
        assert!(store.read().await.is_empty());

        folder.failing.store(false, Ordering::Release);
        assert_eq!(file_contents(&store).await, r#"["A","B"]"#);
    }

    #[tokio::test]
    async fn test_add_custom_token_enables_and_persists() {
        let (wallet, store) = store();
        store.write(set(&["REP"]), None).await.unwrap();

        let token = TokenInfo {
            currency_code: "WINGS".into(),
            currency_name: "Wings".to_string(),
            contract_address: "0x667088b212ce3d06a1b553a7221e1fd19000d9af".to_string(),
            multiplier: "1000000000000000000".to_string(),
        };
        let enabled = store.add_custom_token(&token).await.unwrap();
        assert_eq!(enabled.as_slice(), ["REP", "WINGS"]);
        assert!(wallet.enabled_tokens().await.contains(&"WINGS".to_string()));
    }

    #[tokio::test]
    async fn test_processor_dispatch() {
        let (_, store) = store();
        store
            .process(WriteEnabledTokens {
                tokens: set(&["BTC"]),
                tokens_to_disable: None,
            })
            .await
            .unwrap();
        store
            .process(ReconcileEnabledTokens {
                to_enable: set(&["ETH"]),
                to_disable: set(&[]),
            })
            .await
            .unwrap();
        let enabled = store.process(ReadEnabledTokens).await.unwrap();
        assert_eq!(enabled.as_slice(), ["BTC", "ETH"]);
    }
}
