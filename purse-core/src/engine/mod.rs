//! The wallet engine seam.
//!
//! Key management, UTXO selection, network sync, URI parsing and the
//! signing/broadcast internals all live in an external engine. The core
//! talks to it through [`CurrencyWallet`]. Optional capabilities have
//! default bodies returning [`EngineError::Unsupported`]; the
//! [`WalletGateway`](crate::wallet::WalletGateway) turns those into neutral
//! defaults.

pub mod memory;

use crate::storage::WalletFolder;
use async_trait::async_trait;
use purse_sdk::objects::{
    Metadata, PaymentProtocolInfo, ReceiveAddress, SpendRequest, TokenInfo,
    Transaction, TransactionQuery, UriParseResult,
};
use std::sync::Arc;
use thiserror::Error;

pub use memory::{MemoryWallet, MemoryWalletBuilder};

/// Errors reported by a wallet engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine does not implement this capability.
    #[error("capability not supported by this wallet: {0}")]
    Unsupported(&'static str),

    /// The engine refused the request.
    #[error("{0}")]
    Rejected(String),

    /// Not enough funds to cover amount and fee
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: String, available: String },

    /// URI could not be parsed
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Network or peer failure
    #[error("network error: {0}")]
    Network(String),
}

/// One user wallet as exposed by the engine.
///
/// Handles are owned by the engine; the core only receives them.
#[async_trait]
pub trait CurrencyWallet: Send + Sync {
    /// Stable wallet identifier.
    fn id(&self) -> &str;

    /// Scoped file storage for this wallet.
    fn folder(&self) -> Arc<dyn WalletFolder>;

    async fn rename_wallet(&self, name: &str) -> Result<(), EngineError>;

    async fn get_num_transactions(&self, _currency_code: &str) -> Result<u64, EngineError> {
        Err(EngineError::Unsupported("getNumTransactions"))
    }

    async fn get_transactions(
        &self,
        _currency_code: &str,
        _query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, EngineError> {
        Err(EngineError::Unsupported("getTransactions"))
    }

    async fn save_tx_metadata(
        &self,
        _txid: &str,
        _currency_code: &str,
        _metadata: &Metadata,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unsupported("saveTxMetadata"))
    }

    async fn get_receive_address(&self, _currency_code: &str) -> Result<ReceiveAddress, EngineError> {
        Err(EngineError::Unsupported("getReceiveAddress"))
    }

    async fn get_payment_protocol_info(&self, uri: &str)
    -> Result<PaymentProtocolInfo, EngineError>;

    async fn make_spend(&self, _request: &SpendRequest) -> Result<Transaction, EngineError> {
        Err(EngineError::Unsupported("makeSpend"))
    }

    async fn get_max_spendable(&self, _request: &SpendRequest) -> Result<String, EngineError> {
        Err(EngineError::Unsupported("getMaxSpendable"))
    }

    async fn get_balance(&self, _currency_code: &str) -> Result<String, EngineError> {
        Err(EngineError::Unsupported("getBalance"))
    }

    async fn enable_tokens(&self, tokens: &[String]) -> Result<(), EngineError>;

    async fn disable_tokens(&self, tokens: &[String]) -> Result<(), EngineError>;

    async fn add_custom_token(&self, token: &TokenInfo) -> Result<(), EngineError>;

    fn parse_uri(&self, uri: &str) -> Result<UriParseResult, EngineError>;

    async fn sign_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError>;

    async fn broadcast_tx(&self, transaction: Transaction) -> Result<Transaction, EngineError>;

    async fn save_tx(&self, transaction: &Transaction) -> Result<(), EngineError>;

    async fn resync_blockchain(&self) -> Result<(), EngineError>;

    /// `None` (or empty) for receive-only wallets.
    async fn get_display_private_seed(&self) -> Result<Option<String>, EngineError>;
}

/// Shorthand for a shared engine handle.
pub type WalletHandle = Arc<dyn CurrencyWallet>;
